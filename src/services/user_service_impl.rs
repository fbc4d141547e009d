//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::{Caller, FieldErrors};
use crate::models::user::User;
use crate::services::image::{DecodedImage, ImageKind, ImageService};
use crate::services::recipe_service::parse_identifier;
use crate::services::representation::{Representer, UserBase, UserDto};
use crate::services::user_service::{
    AvatarUpload, Credentials, PasswordChange, RegisterPayload, UserError, UserService,
    check_registration,
};

pub struct SeaOrmUserService {
    store: Store,
    images: Arc<ImageService>,
    representer: Representer,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(
        store: Store,
        images: Arc<ImageService>,
        representer: Representer,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            images,
            representer,
            security,
        }
    }

    fn signed_in(caller: &Caller) -> Result<&User, UserError> {
        caller.user().ok_or(UserError::Unauthenticated)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        payload: Result<RegisterPayload, String>,
    ) -> Result<UserBase, UserError> {
        let payload = payload.map_err(|message| {
            UserError::Validation(FieldErrors::single("non_field_errors", message))
        })?;
        let new_user = check_registration(payload).map_err(UserError::Validation)?;

        let mut errors = FieldErrors::new();
        if self.store.email_exists(&new_user.email).await? {
            errors.add("email", "A user with that email already exists.");
        }
        if self.store.username_exists(&new_user.username).await? {
            errors.add("username", "A user with that username already exists.");
        }
        let new_user = errors.into_result(new_user).map_err(UserError::Validation)?;

        let user = self.store.create_user(new_user, &self.security).await?;
        info!(user_id = user.id, username = %user.username, "User registered");

        Ok(UserBase::from(&user))
    }

    async fn list(
        &self,
        caller: &Caller,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<UserDto>, u64), UserError> {
        let (users, total) = self.store.list_users(offset, limit).await?;
        let users = self.representer.users(caller, &users).await?;
        Ok((users, total))
    }

    async fn get(&self, caller: &Caller, raw_id: &str) -> Result<UserDto, UserError> {
        let id = parse_identifier(raw_id).ok_or(UserError::InvalidIdentifier)?;
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(self.representer.user(caller, &user).await?)
    }

    async fn me(&self, caller: &Caller) -> Result<UserDto, UserError> {
        let user = Self::signed_in(caller)?;
        Ok(self.representer.user(caller, user).await?)
    }

    async fn set_avatar(&self, caller: &Caller, upload: AvatarUpload) -> Result<String, UserError> {
        let user = Self::signed_in(caller)?;

        let image = match upload {
            AvatarUpload::DataUri(raw) if !raw.trim().is_empty() => {
                DecodedImage::from_data_uri(&raw)?
            }
            AvatarUpload::File { filename, bytes } if !bytes.is_empty() => {
                DecodedImage::from_upload(filename.as_deref(), bytes)?
            }
            _ => {
                return Err(UserError::Validation(FieldErrors::single(
                    "avatar",
                    "This field is required.",
                )));
            }
        };

        let stored = self.images.store(ImageKind::Avatar, image).await?;
        if let Err(e) = self.store.set_user_avatar(user.id, Some(stored.clone())).await {
            self.images.remove(&stored).await;
            return Err(e.into());
        }

        if let Some(previous) = &user.avatar {
            self.images.remove(previous).await;
        }

        info!(user_id = user.id, "Avatar updated");
        Ok(self.images.url(&stored))
    }

    async fn delete_avatar(&self, caller: &Caller) -> Result<(), UserError> {
        let user = Self::signed_in(caller)?;

        if let Some(previous) = &user.avatar {
            self.store.set_user_avatar(user.id, None).await?;
            self.images.remove(previous).await;
            info!(user_id = user.id, "Avatar removed");
        }

        Ok(())
    }

    async fn set_password(&self, caller: &Caller, change: PasswordChange) -> Result<(), UserError> {
        let user = Self::signed_in(caller)?;

        let (Some(current), Some(new)) = (
            change.current_password.filter(|p| !p.is_empty()),
            change.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(UserError::PasswordFieldsMissing);
        };

        if !self.store.verify_user_password(user.id, &current).await? {
            warn!(user_id = user.id, "Password change with wrong current password");
            return Err(UserError::WrongPassword);
        }

        self.store
            .update_user_password(user.id, &new, &self.security)
            .await?;

        info!(user_id = user.id, "Password changed");
        Ok(())
    }

    async fn login(&self, credentials: Credentials) -> Result<String, UserError> {
        let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
            return Err(UserError::InvalidCredentials);
        };

        let Some(user) = self.store.get_user_by_email(email.trim()).await? else {
            return Err(UserError::InvalidCredentials);
        };

        if !self.store.verify_user_password(user.id, &password).await? {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(UserError::InvalidCredentials);
        }

        let token = self.store.get_or_create_token(user.id).await?;
        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    async fn logout(&self, caller: &Caller) -> Result<(), UserError> {
        let user = Self::signed_in(caller)?;
        self.store.delete_token(user.id).await?;
        info!(user_id = user.id, "User logged out");
        Ok(())
    }

    async fn user_for_token(&self, key: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.user_for_token(key).await?)
    }
}
