use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::domain::FieldErrors;
use crate::services::{RecipeError, SubscriptionError, UserError};

/// Which top-level key carries a single error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    Detail,
    Errors,
}

impl ErrorKey {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Detail => "detail",
            Self::Errors => "errors",
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(ErrorKey, String),

    BadRequest(ErrorKey, String),

    /// An unexpected failure on a mutating path, reported to the client as
    /// a 400 with its raw text.
    RawFailure(ErrorKey, String),

    Unauthorized(String),

    Forbidden(String),

    Fields(FieldErrors),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(_, msg) => write!(f, "Not found: {msg}"),
            Self::BadRequest(_, msg) => write!(f, "Bad request: {msg}"),
            Self::RawFailure(_, msg) => write!(f, "Failure: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::Fields(errors) => write!(f, "Validation error: {errors}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let keyed = |status: StatusCode, key: ErrorKey, msg: String| {
            (status, Json(json!({ key.as_str(): msg }))).into_response()
        };

        match self {
            Self::NotFound(key, msg) => keyed(StatusCode::NOT_FOUND, key, msg),
            Self::BadRequest(key, msg) => keyed(StatusCode::BAD_REQUEST, key, msg),
            Self::RawFailure(key, msg) => {
                tracing::warn!(error = %msg, "Request failed");
                keyed(StatusCode::BAD_REQUEST, key, msg)
            }
            Self::Unauthorized(msg) => keyed(StatusCode::UNAUTHORIZED, ErrorKey::Detail, msg),
            Self::Forbidden(msg) => keyed(StatusCode::FORBIDDEN, ErrorKey::Detail, msg),
            Self::Fields(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                keyed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKey::Detail,
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(ErrorKey::Detail, msg.into())
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    /// Moves single-message bodies under `key`.
    #[must_use]
    pub fn keyed(self, key: ErrorKey) -> Self {
        match self {
            Self::NotFound(_, msg) => Self::NotFound(key, msg),
            Self::BadRequest(_, msg) => Self::BadRequest(key, msg),
            Self::RawFailure(_, msg) => Self::RawFailure(key, msg),
            other => other,
        }
    }

    /// Read-only endpoints report unexpected failures as 500.
    #[must_use]
    pub fn on_read_path(self) -> Self {
        match self {
            Self::RawFailure(_, msg) => Self::InternalError(msg),
            other => other,
        }
    }
}

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        let msg = err.to_string();
        match err {
            RecipeError::NotFound | RecipeError::TargetNotFound(_) => {
                Self::NotFound(ErrorKey::Detail, msg)
            }
            RecipeError::InvalidIdentifier
            | RecipeError::AlreadyExists(_)
            | RecipeError::NotPresent(_) => Self::BadRequest(ErrorKey::Detail, msg),
            RecipeError::EmptyCart => Self::BadRequest(ErrorKey::Errors, msg),
            RecipeError::Unauthenticated => Self::Unauthorized(msg),
            RecipeError::Forbidden => Self::Forbidden(msg),
            RecipeError::Validation(errors) => Self::Fields(errors),
            RecipeError::Database(raw) | RecipeError::Internal(raw) => {
                Self::RawFailure(ErrorKey::Detail, raw)
            }
        }
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        let msg = err.to_string();
        match err {
            SubscriptionError::Unauthenticated => Self::Unauthorized(msg),
            SubscriptionError::NotFound => Self::NotFound(ErrorKey::Detail, msg),
            SubscriptionError::InvalidIdentifier
            | SubscriptionError::SelfSubscription
            | SubscriptionError::AlreadySubscribed
            | SubscriptionError::NotSubscribed => Self::BadRequest(ErrorKey::Errors, msg),
            SubscriptionError::Database(raw) | SubscriptionError::Internal(raw) => {
                Self::InternalError(raw)
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        let msg = err.to_string();
        match err {
            UserError::Unauthenticated => Self::Unauthorized(msg),
            UserError::InvalidIdentifier => Self::BadRequest(ErrorKey::Detail, msg),
            UserError::NotFound => Self::NotFound(ErrorKey::Detail, msg),
            UserError::Validation(errors) => Self::Fields(errors),
            UserError::InvalidCredentials => {
                Self::Fields(FieldErrors::single("non_field_errors", msg))
            }
            UserError::PasswordFieldsMissing | UserError::WrongPassword => {
                Self::BadRequest(ErrorKey::Errors, msg)
            }
            UserError::Database(raw) | UserError::Internal(raw) => Self::InternalError(raw),
        }
    }
}
