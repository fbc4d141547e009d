use axum::{
    Extension, Json,
    extract::{
        FromRequest, Multipart, OriginalUri, Path, Query, Request, State,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use super::validation::{PageParams, PageRequest, json_body};
use super::{ApiError, AppState, AvatarRequest, AvatarResponse, Page, RecipesLimitParams};
use crate::domain::{Caller, FieldErrors};
use crate::services::AvatarUpload;
use crate::services::representation::{SubscriptionDto, UserBase, UserDto};
use crate::services::subscription_service::parse_recipes_limit;
use crate::services::user_service::{PasswordChange, RegisterPayload};

/// POST /users/
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<UserBase>), ApiError> {
    let user = state.shared.user_service.register(json_body(body)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(paging): Query<PageParams>,
) -> Result<Json<Page<UserDto>>, ApiError> {
    let config = state.config();
    let request = PageRequest::from_params(&paging, &config.pagination);

    let (users, total) = state
        .shared
        .user_service
        .list(&caller, request.offset(), request.limit)
        .await?;
    request.check(total)?;

    Ok(Json(Page::new(
        users,
        total,
        request,
        &config.server.public_url,
        uri.path(),
        uri.query(),
    )))
}

/// GET /users/{id}/
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.shared.user_service.get(&caller, &raw_id).await?;
    Ok(Json(user))
}

/// GET /users/me/
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.shared.user_service.me(&caller).await?;
    Ok(Json(user))
}

/// PUT /users/me/avatar/
///
/// Accepts `{"avatar": "data:..."}` or a multipart form with an `avatar` part.
pub async fn set_avatar(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    request: Request,
) -> Result<Json<AvatarResponse>, ApiError> {
    if !caller.is_authenticated() {
        return Err(ApiError::unauthenticated());
    }

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let upload = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| avatar_error(rejection.body_text()))?;
        read_avatar_part(multipart).await?
    } else {
        match Json::<AvatarRequest>::from_request(request, &state).await {
            Ok(Json(AvatarRequest {
                avatar: Some(avatar),
            })) => AvatarUpload::DataUri(avatar),
            _ => AvatarUpload::Missing,
        }
    };

    let avatar = state
        .shared
        .user_service
        .set_avatar(&caller, upload)
        .await?;

    Ok(Json(AvatarResponse {
        avatar: Some(avatar),
    }))
}

fn avatar_error(message: String) -> ApiError {
    ApiError::Fields(FieldErrors::single("avatar", message))
}

async fn read_avatar_part(mut multipart: Multipart) -> Result<AvatarUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| avatar_error(e.body_text()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| avatar_error(e.body_text()))?;

        return Ok(match filename {
            Some(filename) => AvatarUpload::File {
                filename: Some(filename),
                bytes: bytes.to_vec(),
            },
            None => AvatarUpload::DataUri(String::from_utf8_lossy(&bytes).into_owned()),
        });
    }

    Ok(AvatarUpload::Missing)
}

/// DELETE /users/me/avatar/
pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    state.shared.user_service.delete_avatar(&caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/set_password/
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let change = json_body(body).unwrap_or_default();
    state
        .shared
        .user_service
        .set_password(&caller, change)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{id}/subscribe/
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    Query(params): Query<RecipesLimitParams>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .shared
        .subscription_service
        .subscribe(
            &caller,
            &raw_id,
            parse_recipes_limit(params.recipes_limit.as_deref()),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /users/{id}/subscribe/
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .shared
        .subscription_service
        .unsubscribe(&caller, &raw_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions/
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(paging): Query<PageParams>,
    Query(params): Query<RecipesLimitParams>,
) -> Result<Json<Page<SubscriptionDto>>, ApiError> {
    let config = state.config();
    let request = PageRequest::from_params(&paging, &config.pagination);

    let (authors, total) = state
        .shared
        .subscription_service
        .list(
            &caller,
            request.offset(),
            request.limit,
            parse_recipes_limit(params.recipes_limit.as_deref()),
        )
        .await?;
    request.check(total)?;

    Ok(Json(Page::new(
        authors,
        total,
        request,
        &config.server.public_url,
        uri.path(),
        uri.query(),
    )))
}
