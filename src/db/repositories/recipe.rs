use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
    sea_query::{Expr, Query},
};

use crate::entities::{
    favorites, ingredients, prelude::*, recipe_ingredients, recipes, shopping_carts,
};
use crate::models::recipe::{
    IngredientAmount, NewRecipe, RecipeChanges, RecipeIngredientRow, ShoppingListItem,
};

/// Predicates applied to the recipe listing. All present predicates are ANDed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub author_id: Option<i32>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<recipes::Model>> {
        Recipes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query recipe")
    }

    fn filtered(query: RecipeQuery) -> Select<Recipes> {
        let mut select = Recipes::find();

        if let Some(author_id) = query.author_id {
            select = select.filter(recipes::Column::AuthorId.eq(author_id));
        }

        if let Some(user_id) = query.favorited_by {
            select = select.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(favorites::Column::RecipeId)
                        .from(Favorites)
                        .and_where(favorites::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }

        if let Some(user_id) = query.in_cart_of {
            select = select.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_carts::Column::RecipeId)
                        .from(ShoppingCarts)
                        .and_where(shopping_carts::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }

        select
    }

    /// One page of recipes, newest first, plus the total matching count.
    pub async fn list_page(
        &self,
        query: RecipeQuery,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<recipes::Model>, u64)> {
        let total = Self::filtered(query)
            .count(&self.conn)
            .await
            .context("Failed to count recipes")?;

        let rows = Self::filtered(query)
            .order_by_desc(recipes::Column::PubDate)
            .order_by_desc(recipes::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list recipes")?;

        Ok((rows, total))
    }

    pub async fn list_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .order_by_desc(recipes::Column::PubDate)
            .order_by_desc(recipes::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list recipes by author")
    }

    pub async fn count_by_author(&self, author_id: i32) -> Result<u64> {
        Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .count(&self.conn)
            .await
            .context("Failed to count recipes by author")
    }

    /// Ingredient rows of every recipe in `recipe_ids`, ordered by name.
    pub async fn ingredients_for(&self, recipe_ids: &[i32]) -> Result<Vec<RecipeIngredientRow>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        RecipeIngredients::find()
            .select_only()
            .column_as(recipe_ingredients::Column::RecipeId, "recipe_id")
            .column_as(recipe_ingredients::Column::IngredientId, "ingredient_id")
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount, "amount")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(ingredients::Column::Name)
            .into_model::<RecipeIngredientRow>()
            .all(&self.conn)
            .await
            .context("Failed to load recipe ingredients")
    }

    pub async fn create(&self, recipe: NewRecipe) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let model = recipes::ActiveModel {
            author_id: Set(recipe.author_id),
            name: Set(recipe.name),
            text: Set(recipe.text),
            image: Set(recipe.image),
            cooking_time: Set(recipe.cooking_time),
            pub_date: Set(crate::db::now_timestamp()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        insert_ingredients(&txn, model.id, &recipe.ingredients).await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Applies scalar changes and replaces the ingredient rows atomically.
    pub async fn update(&self, id: i32, changes: RecipeChanges) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let current = Recipes::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Recipe {id} not found"))?;

        let mut active: recipes::ActiveModel = current.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(image) = changes.image {
            active.image = Set(image);
        }
        if let Some(cooking_time) = changes.cooking_time {
            active.cooking_time = Set(cooking_time);
        }

        let model = if active.is_changed() {
            active
                .update(&txn)
                .await
                .context("Failed to update recipe")?
        } else {
            current
        };

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to clear recipe ingredients")?;

        insert_ingredients(&txn, id, &changes.ingredients).await?;

        txn.commit().await?;
        Ok(model)
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        Recipes::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete recipe")?;
        Ok(())
    }

    /// Ingredients of every recipe in the user's cart, grouped by
    /// `(name, unit)` with amounts summed, ordered by name.
    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>> {
        RecipeIngredients::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(
                Expr::col((RecipeIngredients, recipe_ingredients::Column::Amount)).sum(),
                "total_amount",
            )
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(
                recipe_ingredients::Column::RecipeId.in_subquery(
                    Query::select()
                        .column(shopping_carts::Column::RecipeId)
                        .from(ShoppingCarts)
                        .and_where(shopping_carts::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .into_model::<ShoppingListItem>()
            .all(&self.conn)
            .await
            .context("Failed to build shopping list")
    }
}

async fn insert_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    items: &[IngredientAmount],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    let models = items.iter().map(|item| recipe_ingredients::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.ingredient_id),
        amount: Set(item.amount),
    });

    RecipeIngredients::insert_many(models)
        .exec_without_returning(conn)
        .await
        .context("Failed to insert recipe ingredients")?;

    Ok(())
}
