use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use super::validation::{PageParams, PageRequest, json_body};
use super::{ApiError, AppState, ErrorKey, Page, ShortLinkResponse};
use crate::domain::{Caller, RelationKind};
use crate::services::recipe_service::{RecipeError, parse_identifier};
use crate::services::representation::{RecipeDto, ShortRecipeDto};
use crate::services::shopping_list;
use crate::services::{RecipeFilter, RecipeFilterParams, RecipePayload, WriteMode};

/// GET /recipes/
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    Query(filter): Query<RecipeFilterParams>,
    Query(paging): Query<PageParams>,
) -> Result<Json<Page<RecipeDto>>, ApiError> {
    let config = state.config();
    let request = PageRequest::from_params(&paging, &config.pagination);

    let (recipes, total) = state
        .shared
        .recipe_service
        .list(
            &caller,
            RecipeFilter::from_params(&filter),
            request.offset(),
            request.limit,
        )
        .await
        .map_err(|e| ApiError::from(e).on_read_path())?;
    request.check(total)?;

    Ok(Json(Page::new(
        recipes,
        total,
        request,
        &config.server.public_url,
        uri.path(),
        uri.query(),
    )))
}

/// POST /recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state
        .shared
        .recipe_service
        .create(&caller, json_body(body))
        .await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// GET /recipes/{id}/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<RecipeDto>, ApiError> {
    let id = parse_identifier(&raw_id).ok_or(RecipeError::InvalidIdentifier)?;
    let recipe = state.shared.recipe_service.get(&caller, id).await?;
    Ok(Json(recipe))
}

async fn write_recipe(
    state: &AppState,
    caller: &Caller,
    raw_id: &str,
    body: Result<Json<RecipePayload>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<RecipeDto>, ApiError> {
    // A malformed id can never name an existing recipe.
    let id = parse_identifier(raw_id).ok_or(RecipeError::NotFound)?;
    let recipe = state
        .shared
        .recipe_service
        .update(caller, id, json_body(body), mode)
        .await?;
    Ok(Json(recipe))
}

/// PUT /recipes/{id}/
pub async fn replace_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    body: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<Json<RecipeDto>, ApiError> {
    write_recipe(&state, &caller, &raw_id, body, WriteMode::Replace).await
}

/// PATCH /recipes/{id}/
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    body: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<Json<RecipeDto>, ApiError> {
    write_recipe(&state, &caller, &raw_id, body, WriteMode::Partial).await
}

/// DELETE /recipes/{id}/
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_identifier(&raw_id).ok_or(RecipeError::NotFound)?;
    state.shared.recipe_service.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relation(
    state: &AppState,
    caller: &Caller,
    kind: RelationKind,
    raw_id: &str,
) -> Result<(StatusCode, Json<ShortRecipeDto>), ApiError> {
    let recipe = state
        .shared
        .recipe_service
        .add_relation(caller, kind, raw_id)
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_relation(
    state: &AppState,
    caller: &Caller,
    kind: RelationKind,
    raw_id: &str,
) -> Result<StatusCode, ApiError> {
    state
        .shared
        .recipe_service
        .remove_relation(caller, kind, raw_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite/
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<(StatusCode, Json<ShortRecipeDto>), ApiError> {
    add_relation(&state, &caller, RelationKind::Favorite, &raw_id).await
}

/// DELETE /recipes/{id}/favorite/
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    remove_relation(&state, &caller, RelationKind::Favorite, &raw_id).await
}

/// POST /recipes/{id}/shopping_cart/
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<(StatusCode, Json<ShortRecipeDto>), ApiError> {
    add_relation(&state, &caller, RelationKind::ShoppingCart, &raw_id).await
}

/// DELETE /recipes/{id}/shopping_cart/
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    remove_relation(&state, &caller, RelationKind::ShoppingCart, &raw_id).await
}

/// GET /recipes/download_shopping_cart/
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let text = state
        .shared
        .recipe_service
        .shopping_list(&caller)
        .await
        .map_err(|e| ApiError::from(e).keyed(ErrorKey::Errors))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", shopping_list::FILENAME),
            ),
        ],
        text,
    ))
}

/// GET /recipes/{id}/get-link/
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    let short_link = state.shared.recipe_service.short_link(&raw_id).await?;
    Ok(Json(ShortLinkResponse { short_link }))
}
