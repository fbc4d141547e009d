use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{ApiError, AppState, ErrorKey, IngredientSearch};
use crate::services::recipe_service::parse_identifier;
use crate::services::representation::IngredientDto;

/// GET /ingredients/?name=
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<IngredientDto>>, ApiError> {
    let prefix = search.name.as_deref().filter(|name| !name.is_empty());

    let ingredients = state.store().search_ingredients(prefix).await?;

    Ok(Json(ingredients.into_iter().map(IngredientDto::from).collect()))
}

/// GET /ingredients/{id}/
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<IngredientDto>, ApiError> {
    let id = parse_identifier(&raw_id).ok_or_else(|| {
        ApiError::BadRequest(ErrorKey::Detail, "Invalid ingredient ID.".to_string())
    })?;

    let ingredient = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;

    Ok(Json(IngredientDto::from(ingredient)))
}
