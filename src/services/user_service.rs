//! Domain service for accounts, profiles, avatars and login tokens.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use thiserror::Error;

use crate::domain::{Caller, FieldErrors};
use crate::models::user::{NewUser, User};
use crate::services::image::ImageError;
use crate::services::representation::{UserBase, UserDto};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NAME_MAX_CHARS: usize = 150;
const EMAIL_MAX_CHARS: usize = 254;

static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").ok());

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("Invalid user ID.")]
    InvalidIdentifier,

    #[error("Not found.")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    #[error("Both current_password and new_password are required.")]
    PasswordFieldsMissing,

    #[error("Current password is incorrect.")]
    WrongPassword,

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<ImageError> for UserError {
    fn from(err: ImageError) -> Self {
        if err.is_invalid_input() {
            Self::Validation(FieldErrors::single("avatar", err.to_string()))
        } else {
            Self::Internal(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPayload {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// An avatar as it arrived over the wire.
#[derive(Debug, Clone)]
pub enum AvatarUpload {
    DataUri(String),
    File {
        filename: Option<String>,
        bytes: Vec<u8>,
    },
    Missing,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required_text(
    value: Option<String>,
    field: &str,
    max_chars: usize,
    errors: &mut FieldErrors,
) -> String {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return String::new();
    };

    let value = value.trim().to_string();
    if value.is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        );
    }
    value
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Structural validation of a registration. Uniqueness is checked later
/// against the store.
pub fn check_registration(payload: RegisterPayload) -> Result<NewUser, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = required_text(payload.email, "email", EMAIL_MAX_CHARS, &mut errors);
    if !errors.contains("email") && !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }

    let username = required_text(payload.username, "username", NAME_MAX_CHARS, &mut errors);
    if !errors.contains("username")
        && !USERNAME_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&username))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let first_name = required_text(payload.first_name, "first_name", NAME_MAX_CHARS, &mut errors);
    let last_name = required_text(payload.last_name, "last_name", NAME_MAX_CHARS, &mut errors);

    let password = match payload.password {
        Some(password) if !password.is_empty() => password,
        Some(_) => {
            errors.add("password", BLANK);
            String::new()
        }
        None => {
            errors.add("password", REQUIRED);
            String::new()
        }
    };

    errors.into_result(NewUser {
        username,
        email,
        first_name,
        last_name,
        password,
    })
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn register(
        &self,
        payload: Result<RegisterPayload, String>,
    ) -> Result<UserBase, UserError>;

    /// One page of users ordered by id, plus the total count.
    async fn list(
        &self,
        caller: &Caller,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<UserDto>, u64), UserError>;

    /// # Errors
    ///
    /// [`UserError::InvalidIdentifier`] when `raw_id` is not an integer,
    /// [`UserError::NotFound`] when no such user exists.
    async fn get(&self, caller: &Caller, raw_id: &str) -> Result<UserDto, UserError>;

    async fn me(&self, caller: &Caller) -> Result<UserDto, UserError>;

    /// Replaces the caller's avatar and returns its URL.
    async fn set_avatar(&self, caller: &Caller, upload: AvatarUpload) -> Result<String, UserError>;

    async fn delete_avatar(&self, caller: &Caller) -> Result<(), UserError>;

    async fn set_password(&self, caller: &Caller, change: PasswordChange) -> Result<(), UserError>;

    /// Exchanges email and password for the user's token.
    async fn login(&self, credentials: Credentials) -> Result<String, UserError>;

    async fn logout(&self, caller: &Caller) -> Result<(), UserError>;

    /// Resolves an `Authorization: Token` key. `None` means the key is unknown.
    async fn user_for_token(&self, key: &str) -> Result<Option<User>, UserError>;
}
