use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};

use crate::entities::{auth_tokens, users};
use crate::models::user::User;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the user's token, creating one on first login.
    pub async fn get_or_create(&self, user_id: i32) -> Result<String> {
        if let Some(existing) = self.find_for_user(user_id).await? {
            return Ok(existing);
        }

        auth_tokens::Entity::insert(auth_tokens::ActiveModel {
            key: Set(generate_token()),
            user_id: Set(user_id),
            created_at: Set(crate::db::now_timestamp()),
        })
        .on_conflict(
            OnConflict::column(auth_tokens::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert auth token")?;

        // A concurrent login may have won the insert.
        self.find_for_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Token for user {user_id} vanished after insert"))
    }

    async fn find_for_user(&self, user_id: i32) -> Result<Option<String>> {
        let token = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        Ok(token.map(|t| t.key))
    }

    pub async fn user_for_key(&self, key: &str) -> Result<Option<User>> {
        let row = auth_tokens::Entity::find_by_id(key.to_string())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(row.and_then(|(_, user)| user).map(User::from))
    }

    pub async fn delete_for_user(&self, user_id: i32) -> Result<()> {
        auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete auth token")?;

        Ok(())
    }
}

/// Generate a random token (40 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
