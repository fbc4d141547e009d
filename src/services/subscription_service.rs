//! Domain service for following authors.

use thiserror::Error;

use crate::domain::Caller;
use crate::services::representation::SubscriptionDto;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("Invalid user ID.")]
    InvalidIdentifier,

    #[error("Not found.")]
    NotFound,

    #[error("You cannot subscribe to yourself.")]
    SelfSubscription,

    #[error("You are already subscribed to this user.")]
    AlreadySubscribed,

    #[error("You are not subscribed to this user.")]
    NotSubscribed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SubscriptionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SubscriptionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Reads `recipes_limit`. Anything that is not a non-negative integer in
/// SQLite's range is ignored and the author's recipes are returned unclipped.
#[must_use]
pub fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(|limit| u64::try_from(limit).ok())
}

#[async_trait::async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Follows the author identified by `raw_id`.
    ///
    /// # Errors
    ///
    /// Checked in order: [`SubscriptionError::Unauthenticated`],
    /// [`SubscriptionError::InvalidIdentifier`], [`SubscriptionError::NotFound`],
    /// [`SubscriptionError::SelfSubscription`], [`SubscriptionError::AlreadySubscribed`].
    async fn subscribe(
        &self,
        caller: &Caller,
        raw_id: &str,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, SubscriptionError>;

    async fn unsubscribe(&self, caller: &Caller, raw_id: &str) -> Result<(), SubscriptionError>;

    /// One page of the authors the caller follows, plus the total count.
    async fn list(
        &self,
        caller: &Caller,
        offset: u64,
        limit: u64,
        recipes_limit: Option<u64>,
    ) -> Result<(Vec<SubscriptionDto>, u64), SubscriptionError>;
}
