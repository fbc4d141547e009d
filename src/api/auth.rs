use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::json_body;
use super::{ApiError, AppState, TokenResponse};
use crate::domain::Caller;
use crate::services::user_service::Credentials;

/// Keys some clients send when they have no token yet.
const PLACEHOLDER_KEYS: [&str; 4] = ["", "null", "undefined", "none"];

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Token <key>` into a [`Caller`] extension.
///
/// A missing header or a placeholder key leaves the request anonymous; an
/// unknown key is rejected here, before any handler runs.
pub async fn caller_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match extract_token(&headers) {
        None => Caller::Anonymous,
        Some(key) => {
            let user = state
                .shared
                .user_service
                .user_for_token(&key)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;

            tracing::Span::current().record("user_id", user.id);
            Caller::User(user)
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();

    let (scheme, key) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }

    let key = key.trim();
    if PLACEHOLDER_KEYS
        .iter()
        .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
    {
        return None;
    }

    Some(key.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = json_body(body).unwrap_or_default();

    let auth_token = state.shared.user_service.login(credentials).await?;

    Ok(Json(TokenResponse { auth_token }))
}

/// POST /auth/token/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    state.shared.user_service.logout(&caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
