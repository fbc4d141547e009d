//! Favorites and shopping carts share one repository; [`RelationKind`]
//! picks the table.

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};
use std::collections::HashSet;

use crate::domain::RelationKind;
use crate::entities::{favorites, prelude::*, shopping_carts};

pub struct RelationRepository {
    conn: DatabaseConnection,
}

impl RelationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the pair; `false` when it was already present.
    pub async fn add(&self, kind: RelationKind, user_id: i32, recipe_id: i32) -> Result<bool> {
        let inserted = match kind {
            RelationKind::Favorite => {
                Favorites::insert(favorites::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .on_conflict(
                    OnConflict::columns([favorites::Column::UserId, favorites::Column::RecipeId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
            }
            RelationKind::ShoppingCart => {
                ShoppingCarts::insert(shopping_carts::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .on_conflict(
                    OnConflict::columns([
                        shopping_carts::Column::UserId,
                        shopping_carts::Column::RecipeId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
            }
        }
        .with_context(|| format!("Failed to add {kind}"))?;

        Ok(inserted > 0)
    }

    /// Deletes the pair; `false` when there was nothing to delete.
    pub async fn remove(&self, kind: RelationKind, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = match kind {
            RelationKind::Favorite => {
                Favorites::delete_by_id((user_id, recipe_id))
                    .exec(&self.conn)
                    .await
            }
            RelationKind::ShoppingCart => {
                ShoppingCarts::delete_by_id((user_id, recipe_id))
                    .exec(&self.conn)
                    .await
            }
        }
        .with_context(|| format!("Failed to remove {kind}"))?;

        Ok(result.rows_affected > 0)
    }

    /// Which of `recipe_ids` the user holds in the relation.
    pub async fn contains_many(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = recipe_ids.iter().copied();
        let found: Vec<i32> = match kind {
            RelationKind::Favorite => {
                Favorites::find()
                    .select_only()
                    .column(favorites::Column::RecipeId)
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
            RelationKind::ShoppingCart => {
                ShoppingCarts::find()
                    .select_only()
                    .column(shopping_carts::Column::RecipeId)
                    .filter(shopping_carts::Column::UserId.eq(user_id))
                    .filter(shopping_carts::Column::RecipeId.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
        }
        .with_context(|| format!("Failed to query {kind} membership"))?;

        Ok(found.into_iter().collect())
    }

    pub async fn count(&self, kind: RelationKind, user_id: i32) -> Result<u64> {
        match kind {
            RelationKind::Favorite => {
                Favorites::find()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .count(&self.conn)
                    .await
            }
            RelationKind::ShoppingCart => {
                ShoppingCarts::find()
                    .filter(shopping_carts::Column::UserId.eq(user_id))
                    .count(&self.conn)
                    .await
            }
        }
        .with_context(|| format!("Failed to count {kind} entries"))
    }
}
