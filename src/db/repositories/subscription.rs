use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, sea_query::OnConflict,
};
use std::collections::HashSet;

use crate::entities::{prelude::*, subscriptions, users};
use crate::models::user::User;

pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the follow; `false` when it already existed.
    pub async fn add(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let inserted = Subscriptions::insert(subscriptions::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
        })
        .on_conflict(
            OnConflict::columns([subscriptions::Column::UserId, subscriptions::Column::AuthorId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to add subscription")?;

        Ok(inserted > 0)
    }

    /// Deletes the follow; `false` when there was none.
    pub async fn remove(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Subscriptions::delete_by_id((user_id, author_id))
            .exec(&self.conn)
            .await
            .context("Failed to remove subscription")?;

        Ok(result.rows_affected > 0)
    }

    /// Which of `author_ids` the user follows.
    pub async fn subscribed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<i32> = Subscriptions::find()
            .select_only()
            .column(subscriptions::Column::AuthorId)
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.is_in(author_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query subscriptions")?;

        Ok(found.into_iter().collect())
    }

    /// Authors the user follows, ordered by id, plus the total count.
    pub async fn list_authors_page(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64)> {
        let query = Users::find()
            .join(JoinType::InnerJoin, subscriptions::Relation::Author.def().rev())
            .filter(subscriptions::Column::UserId.eq(user_id));

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count subscriptions")?;

        let rows = query
            .order_by_asc(users::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list subscriptions")?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }
}
