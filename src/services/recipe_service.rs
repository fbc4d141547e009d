//! Domain service for recipes and the per-user recipe relations.
//!
//! Handles listing, the guarded create/update/delete flow, favorites and
//! shopping-cart toggles, and the shopping-list download.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Caller, FieldErrors, RelationKind};
use crate::models::recipe::IngredientAmount;
use crate::services::access::Denied;
use crate::services::filter::RecipeFilter;
use crate::services::image::{DecodedImage, ImageError};
use crate::services::representation::{RecipeDto, ShortRecipeDto};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const MIN_ONE: &str = "Ensure this value is greater than or equal to 1.";
const NAME_MAX_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found.")]
    NotFound,

    #[error("{}", .0.not_found_message())]
    TargetNotFound(RelationKind),

    #[error("Invalid recipe ID.")]
    InvalidIdentifier,

    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{}", .0.already_present_message())]
    AlreadyExists(RelationKind),

    #[error("{}", .0.not_present_message())]
    NotPresent(RelationKind),

    #[error("The shopping list has no recipes.")]
    EmptyCart,

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<Denied> for RecipeError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::NotFound => Self::NotFound,
            Denied::Unauthenticated => Self::Unauthenticated,
            Denied::Forbidden => Self::Forbidden,
            Denied::Invalid(errors) => Self::Validation(errors),
        }
    }
}

impl From<ImageError> for RecipeError {
    fn from(err: ImageError) -> Self {
        if err.is_invalid_input() {
            Self::Validation(FieldErrors::single("image", err.to_string()))
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// How a write treats omitted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    /// `PUT`: every field is required.
    Replace,
    /// `PATCH`: only `ingredients` is required.
    Partial,
}

impl WriteMode {
    const fn requires_all(self) -> bool {
        matches!(self, Self::Create | Self::Replace)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientPayload {
    pub id: i64,
    pub amount: i64,
}

/// Body of a recipe write, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Option<Vec<IngredientPayload>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// A payload that passed the structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Structural validation. Whether the ingredient ids exist is checked
/// afterwards against the store.
pub fn check_payload(payload: RecipePayload, mode: WriteMode) -> Result<CheckedRecipe, FieldErrors> {
    let mut errors = FieldErrors::new();

    let ingredients = match payload.ingredients {
        None => {
            errors.add("ingredients", REQUIRED);
            Vec::new()
        }
        Some(items) => check_ingredients(items, &mut errors),
    };

    let name = payload.name.map(|name| {
        if name.trim().is_empty() {
            errors.add("name", BLANK);
        } else if name.chars().count() > NAME_MAX_CHARS {
            errors.add(
                "name",
                format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
            );
        }
        name
    });

    let text = payload.text.inspect(|text| {
        if text.trim().is_empty() {
            errors.add("text", BLANK);
        }
    });

    let cooking_time = payload
        .cooking_time
        .and_then(|minutes| positive_i32(minutes, "cooking_time", &mut errors));

    let image = payload
        .image
        .and_then(|raw| match DecodedImage::from_data_uri(&raw) {
            Ok(image) => Some(image),
            Err(e) => {
                errors.add("image", e.to_string());
                None
            }
        });

    if mode.requires_all() {
        for (field, present) in [
            ("name", name.is_some()),
            ("text", text.is_some()),
            ("cooking_time", payload.cooking_time.is_some()),
            ("image", image.is_some()),
        ] {
            if !present && !errors.contains(field) {
                errors.add(field, REQUIRED);
            }
        }
    }

    errors.into_result(CheckedRecipe {
        name,
        text,
        cooking_time,
        image,
        ingredients,
    })
}

fn check_ingredients(items: Vec<IngredientPayload>, errors: &mut FieldErrors) -> Vec<IngredientAmount> {
    if items.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
        return Vec::new();
    }

    let mut seen = std::collections::HashSet::new();
    let mut checked = Vec::with_capacity(items.len());

    for item in items {
        let Ok(ingredient_id) = i32::try_from(item.id) else {
            errors.add(
                "ingredients",
                format!("Invalid pk \"{}\" - object does not exist.", item.id),
            );
            continue;
        };

        if !seen.insert(ingredient_id) {
            errors.add("ingredients", "Ingredients must not repeat.");
            continue;
        }

        if let Some(amount) = positive_i32(item.amount, "ingredients", errors) {
            checked.push(IngredientAmount {
                ingredient_id,
                amount,
            });
        }
    }

    checked
}

fn positive_i32(value: i64, field: &str, errors: &mut FieldErrors) -> Option<i32> {
    if value < 1 {
        errors.add(field, MIN_ONE);
        return None;
    }
    match i32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
            None
        }
    }
}

/// Domain service trait for recipes.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// One page of recipes, newest first, plus the total count.
    async fn list(
        &self,
        caller: &Caller,
        filter: RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RecipeDto>, u64), RecipeError>;

    async fn get(&self, caller: &Caller, id: i32) -> Result<RecipeDto, RecipeError>;

    /// # Errors
    ///
    /// [`RecipeError::Unauthenticated`] before any payload problem.
    async fn create(
        &self,
        caller: &Caller,
        payload: Result<RecipePayload, String>,
    ) -> Result<RecipeDto, RecipeError>;

    /// # Errors
    ///
    /// Checked in order: [`RecipeError::NotFound`],
    /// [`RecipeError::Unauthenticated`], [`RecipeError::Forbidden`],
    /// [`RecipeError::Validation`]. The ingredient rows are replaced in the
    /// same transaction as the scalar fields.
    async fn update(
        &self,
        caller: &Caller,
        id: i32,
        payload: Result<RecipePayload, String>,
        mode: WriteMode,
    ) -> Result<RecipeDto, RecipeError>;

    async fn delete(&self, caller: &Caller, id: i32) -> Result<(), RecipeError>;

    /// Puts the recipe into the caller's favorites or cart. `raw_id` is
    /// parsed only after authentication.
    async fn add_relation(
        &self,
        caller: &Caller,
        kind: RelationKind,
        raw_id: &str,
    ) -> Result<ShortRecipeDto, RecipeError>;

    async fn remove_relation(
        &self,
        caller: &Caller,
        kind: RelationKind,
        raw_id: &str,
    ) -> Result<(), RecipeError>;

    /// Rendered plain-text shopping list for the caller's cart.
    async fn shopping_list(&self, caller: &Caller) -> Result<String, RecipeError>;

    /// Absolute link to the recipe's page on the site.
    async fn short_link(&self, raw_id: &str) -> Result<String, RecipeError>;
}

/// Parses a path identifier the way every recipe and user route does.
pub fn parse_identifier(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn full() -> RecipePayload {
        RecipePayload {
            ingredients: Some(vec![IngredientPayload { id: 1, amount: 3 }]),
            image: Some(PNG.to_string()),
            name: Some("Omelette".to_string()),
            text: Some("Beat and fry".to_string()),
            cooking_time: Some(10),
        }
    }

    #[test]
    fn complete_payload_passes() {
        let checked = check_payload(full(), WriteMode::Create).unwrap();
        assert_eq!(checked.cooking_time, Some(10));
        assert_eq!(
            checked.ingredients,
            vec![IngredientAmount {
                ingredient_id: 1,
                amount: 3
            }]
        );
        assert_eq!(checked.image.unwrap().extension, "png");
    }

    #[test]
    fn missing_ingredients_fail_in_every_mode() {
        for mode in [WriteMode::Create, WriteMode::Replace, WriteMode::Partial] {
            let payload = RecipePayload {
                ingredients: None,
                ..full()
            };
            let errors = check_payload(payload, mode).unwrap_err();
            assert_eq!(errors.messages("ingredients"), [REQUIRED]);
        }
    }

    #[test]
    fn partial_write_accepts_only_ingredients() {
        let payload = RecipePayload {
            ingredients: Some(vec![IngredientPayload { id: 2, amount: 1 }]),
            ..RecipePayload::default()
        };
        let checked = check_payload(payload.clone(), WriteMode::Partial).unwrap();
        assert_eq!(checked.name, None);
        assert_eq!(checked.image, None);

        let errors = check_payload(payload, WriteMode::Replace).unwrap_err();
        for field in ["name", "text", "cooking_time", "image"] {
            assert!(errors.contains(field), "{field}");
        }
    }

    #[test]
    fn rejects_empty_duplicate_and_non_positive_values() {
        let payload = RecipePayload {
            ingredients: Some(vec![
                IngredientPayload { id: 1, amount: 2 },
                IngredientPayload { id: 1, amount: 4 },
                IngredientPayload { id: 2, amount: 0 },
            ]),
            cooking_time: Some(0),
            name: Some("   ".to_string()),
            ..full()
        };
        let errors = check_payload(payload, WriteMode::Create).unwrap_err();
        assert_eq!(
            errors.messages("ingredients"),
            ["Ingredients must not repeat.", MIN_ONE]
        );
        assert_eq!(errors.messages("cooking_time"), [MIN_ONE]);
        assert_eq!(errors.messages("name"), [BLANK]);

        let empty = RecipePayload {
            ingredients: Some(Vec::new()),
            ..full()
        };
        assert!(check_payload(empty, WriteMode::Partial).is_err());
    }

    #[test]
    fn bad_image_is_reported_once() {
        let payload = RecipePayload {
            image: Some("not-a-data-uri".to_string()),
            ..full()
        };
        let errors = check_payload(payload, WriteMode::Create).unwrap_err();
        assert_eq!(errors.messages("image").len(), 1);
    }

    #[test]
    fn long_names_are_rejected() {
        let payload = RecipePayload {
            name: Some("x".repeat(201)),
            ..full()
        };
        assert!(
            check_payload(payload, WriteMode::Partial)
                .unwrap_err()
                .contains("name")
        );
    }

    #[test]
    fn identifiers_must_be_integers() {
        assert_eq!(parse_identifier("12"), Some(12));
        assert_eq!(parse_identifier("{{recipeId}}"), None);
        assert_eq!(parse_identifier("1.5"), None);
    }
}
