//! `SeaORM` implementation of the `SubscriptionService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::domain::Caller;
use crate::models::user::User;
use crate::services::recipe_service::parse_identifier;
use crate::services::representation::{Representer, SubscriptionDto};
use crate::services::subscription_service::{SubscriptionError, SubscriptionService};

pub struct SeaOrmSubscriptionService {
    store: Store,
    representer: Representer,
}

impl SeaOrmSubscriptionService {
    #[must_use]
    pub const fn new(store: Store, representer: Representer) -> Self {
        Self { store, representer }
    }

    /// Authentication, id parsing, author lookup and the self check, in
    /// that order. Returns `(follower_id, author)`.
    async fn resolve(
        &self,
        caller: &Caller,
        raw_id: &str,
    ) -> Result<(i32, User), SubscriptionError> {
        let follower_id = caller
            .user_id()
            .ok_or(SubscriptionError::Unauthenticated)?;
        let author_id = parse_identifier(raw_id).ok_or(SubscriptionError::InvalidIdentifier)?;

        let author = self
            .store
            .get_user(author_id)
            .await?
            .ok_or(SubscriptionError::NotFound)?;

        if author.id == follower_id {
            return Err(SubscriptionError::SelfSubscription);
        }

        Ok((follower_id, author))
    }
}

#[async_trait]
impl SubscriptionService for SeaOrmSubscriptionService {
    async fn subscribe(
        &self,
        caller: &Caller,
        raw_id: &str,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, SubscriptionError> {
        let (follower_id, author) = self.resolve(caller, raw_id).await?;

        // Rendered first so a failure here leaves no follow behind.
        let subscription = self.representer.subscription(&author, recipes_limit).await?;

        if !self.store.subscribe(follower_id, author.id).await? {
            return Err(SubscriptionError::AlreadySubscribed);
        }

        info!(follower_id, author_id = author.id, "Subscribed");
        Ok(subscription)
    }

    async fn unsubscribe(&self, caller: &Caller, raw_id: &str) -> Result<(), SubscriptionError> {
        let (follower_id, author) = self.resolve(caller, raw_id).await?;

        if !self.store.unsubscribe(follower_id, author.id).await? {
            return Err(SubscriptionError::NotSubscribed);
        }

        info!(follower_id, author_id = author.id, "Unsubscribed");
        Ok(())
    }

    async fn list(
        &self,
        caller: &Caller,
        offset: u64,
        limit: u64,
        recipes_limit: Option<u64>,
    ) -> Result<(Vec<SubscriptionDto>, u64), SubscriptionError> {
        let follower_id = caller
            .user_id()
            .ok_or(SubscriptionError::Unauthenticated)?;

        let (authors, total) = self
            .store
            .list_subscribed_authors(follower_id, offset, limit)
            .await?;

        let mut items = Vec::with_capacity(authors.len());
        for author in &authors {
            items.push(self.representer.subscription(author, recipes_limit).await?);
        }

        Ok((items, total))
    }
}
