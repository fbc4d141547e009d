//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::Store;
use crate::domain::{Caller, FieldErrors, RelationKind};
use crate::models::recipe::{NewRecipe, RecipeChanges};
use crate::services::access::Access;
use crate::services::filter::RecipeFilter;
use crate::services::image::{ImageKind, ImageService};
use crate::services::recipe_service::{
    CheckedRecipe, RecipeError, RecipePayload, RecipeService, WriteMode, check_payload,
    parse_identifier,
};
use crate::services::representation::{RecipeDto, Representer, ShortRecipeDto};
use crate::services::shopping_list;

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
    representer: Representer,
    site_url: url::Url,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(
        store: Store,
        images: Arc<ImageService>,
        representer: Representer,
        site_url: url::Url,
    ) -> Self {
        Self {
            store,
            images,
            representer,
            site_url,
        }
    }

    /// The payload step of the access pipeline.
    async fn validated(
        &self,
        payload: Result<RecipePayload, String>,
        mode: WriteMode,
    ) -> Result<CheckedRecipe, RecipeError> {
        let payload = payload.map_err(|message| {
            RecipeError::Validation(FieldErrors::single("non_field_errors", message))
        })?;

        let checked = check_payload(payload, mode).map_err(RecipeError::Validation)?;

        let ids: Vec<i32> = checked
            .ingredients
            .iter()
            .map(|item| item.ingredient_id)
            .collect();
        let existing = self.store.existing_ingredient_ids(&ids).await?;

        let mut errors = FieldErrors::new();
        for id in ids.iter().filter(|id| !existing.contains(*id)) {
            errors.add(
                "ingredients",
                format!("Invalid pk \"{id}\" - object does not exist."),
            );
        }

        errors.into_result(checked).map_err(RecipeError::Validation)
    }

    fn authenticated(caller: &Caller) -> Result<i32, RecipeError> {
        caller.user_id().ok_or(RecipeError::Unauthenticated)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, RecipeError> {
    value.ok_or_else(|| {
        RecipeError::Validation(FieldErrors::single(field, "This field is required."))
    })
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        caller: &Caller,
        filter: RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RecipeDto>, u64), RecipeError> {
        let Some(query) = filter.to_query(caller) else {
            return Ok((Vec::new(), 0));
        };

        let (recipes, total) = self.store.list_recipes(query, offset, limit).await?;
        let recipes = self.representer.recipes(caller, recipes).await?;

        Ok((recipes, total))
    }

    async fn get(&self, caller: &Caller, id: i32) -> Result<RecipeDto, RecipeError> {
        let recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        Ok(self.representer.recipe(caller, recipe).await?)
    }

    async fn create(
        &self,
        caller: &Caller,
        payload: Result<RecipePayload, String>,
    ) -> Result<RecipeDto, RecipeError> {
        let granted = Access::new(caller)
            .authenticate()?
            .validate(|| self.validated(payload, WriteMode::Create))
            .await?;

        let checked = granted.payload;
        let image = self
            .images
            .store(ImageKind::Recipe, required(checked.image, "image")?)
            .await?;

        let created = self
            .store
            .create_recipe(NewRecipe {
                author_id: granted.user.id,
                name: required(checked.name, "name")?,
                text: required(checked.text, "text")?,
                image: image.clone(),
                cooking_time: required(checked.cooking_time, "cooking_time")?,
                ingredients: checked.ingredients,
            })
            .await;

        let recipe = match created {
            Ok(recipe) => recipe,
            Err(e) => {
                self.images.remove(&image).await;
                return Err(e.into());
            }
        };

        info!(
            recipe_id = recipe.id,
            author_id = granted.user.id,
            "Recipe created"
        );

        Ok(self.representer.recipe(caller, recipe).await?)
    }

    async fn update(
        &self,
        caller: &Caller,
        id: i32,
        payload: Result<RecipePayload, String>,
        mode: WriteMode,
    ) -> Result<RecipeDto, RecipeError> {
        let found = self.store.get_recipe(id).await?;

        let granted = Access::new(caller)
            .locate(found)?
            .authenticate()?
            .authorize()?
            .validate(|| self.validated(payload, mode))
            .await?;

        let checked = granted.payload;
        let new_image = match checked.image {
            Some(image) => Some(self.images.store(ImageKind::Recipe, image).await?),
            None => None,
        };

        let updated = self
            .store
            .update_recipe(
                id,
                RecipeChanges {
                    name: checked.name,
                    text: checked.text,
                    image: new_image.clone(),
                    cooking_time: checked.cooking_time,
                    ingredients: checked.ingredients,
                },
            )
            .await;

        let recipe = match updated {
            Ok(recipe) => recipe,
            Err(e) => {
                if let Some(path) = &new_image {
                    self.images.remove(path).await;
                }
                warn!(recipe_id = id, error = %e, "Recipe update rolled back");
                return Err(e.into());
            }
        };

        if new_image.is_some() {
            self.images.remove(&granted.resource.image).await;
        }

        info!(recipe_id = id, "Recipe updated");

        Ok(self.representer.recipe(caller, recipe).await?)
    }

    async fn delete(&self, caller: &Caller, id: i32) -> Result<(), RecipeError> {
        let found = self.store.get_recipe(id).await?;

        let granted = Access::new(caller)
            .locate(found)?
            .authenticate()?
            .authorize()?
            .grant();

        self.store.delete_recipe(id).await?;
        self.images.remove(&granted.resource.image).await;

        info!(recipe_id = id, user_id = granted.user.id, "Recipe deleted");
        Ok(())
    }

    async fn add_relation(
        &self,
        caller: &Caller,
        kind: RelationKind,
        raw_id: &str,
    ) -> Result<ShortRecipeDto, RecipeError> {
        let user_id = Self::authenticated(caller)?;
        let recipe_id = parse_identifier(raw_id).ok_or(RecipeError::InvalidIdentifier)?;

        let recipe = self
            .store
            .get_recipe(recipe_id)
            .await?
            .ok_or(RecipeError::TargetNotFound(kind))?;

        if !self.store.add_relation(kind, user_id, recipe.id).await? {
            return Err(RecipeError::AlreadyExists(kind));
        }

        info!(%kind, user_id, recipe_id, "Relation added");
        Ok(self.representer.short_recipe(&recipe))
    }

    async fn remove_relation(
        &self,
        caller: &Caller,
        kind: RelationKind,
        raw_id: &str,
    ) -> Result<(), RecipeError> {
        let user_id = Self::authenticated(caller)?;
        let recipe_id = parse_identifier(raw_id).ok_or(RecipeError::InvalidIdentifier)?;

        if self.store.get_recipe(recipe_id).await?.is_none() {
            return Err(RecipeError::TargetNotFound(kind));
        }

        if !self.store.remove_relation(kind, user_id, recipe_id).await? {
            return Err(RecipeError::NotPresent(kind));
        }

        info!(%kind, user_id, recipe_id, "Relation removed");
        Ok(())
    }

    async fn shopping_list(&self, caller: &Caller) -> Result<String, RecipeError> {
        let user_id = Self::authenticated(caller)?;

        if self
            .store
            .count_relation(RelationKind::ShoppingCart, user_id)
            .await?
            == 0
        {
            return Err(RecipeError::EmptyCart);
        }

        let items = self.store.shopping_list(user_id).await?;
        Ok(shopping_list::render(&items))
    }

    async fn short_link(&self, raw_id: &str) -> Result<String, RecipeError> {
        let recipe_id = parse_identifier(raw_id).ok_or(RecipeError::InvalidIdentifier)?;

        if self.store.get_recipe(recipe_id).await?.is_none() {
            return Err(RecipeError::NotFound);
        }

        let link = self
            .site_url
            .join(&format!("/recipes/{recipe_id}/"))
            .map_err(|e| RecipeError::Internal(e.to_string()))?;

        Ok(link.into())
    }
}
