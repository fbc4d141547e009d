//! Response shapes and the single place that builds them.
//!
//! Every user that leaves the API, whether as a recipe author, a profile or
//! a followed author, goes through [`Representer::users`], so
//! `is_subscribed` and `avatar` are computed the same way everywhere.

use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::Store;
use crate::domain::{Caller, RelationKind};
use crate::entities::{ingredients, recipes};
use crate::models::user::User;
use crate::services::image::ImageService;

/// Returned by registration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserBase {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserBase {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserDto {
    #[serde(flatten)]
    pub base: UserBase,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredients::Model> for IngredientDto {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            measurement_unit: model.measurement_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeDto {
    pub id: i32,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShortRecipeDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<ShortRecipeDto>,
    pub recipes_count: u64,
}

#[derive(Clone)]
pub struct Representer {
    store: Store,
    images: Arc<ImageService>,
}

impl Representer {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    #[must_use]
    pub fn avatar_url(&self, user: &User) -> Option<String> {
        user.avatar.as_deref().map(|path| self.images.url(path))
    }

    fn user_with(&self, user: &User, is_subscribed: bool) -> UserDto {
        UserDto {
            base: UserBase::from(user),
            is_subscribed,
            avatar: self.avatar_url(user),
        }
    }

    pub async fn user(&self, viewer: &Caller, user: &User) -> Result<UserDto> {
        let mut users = self.users(viewer, std::slice::from_ref(user)).await?;
        users
            .pop()
            .ok_or_else(|| anyhow::anyhow!("User representation missing"))
    }

    pub async fn users(&self, viewer: &Caller, users: &[User]) -> Result<Vec<UserDto>> {
        let subscribed = match viewer.user_id() {
            Some(viewer_id) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.store.subscribed_among(viewer_id, &ids).await?
            }
            None => HashSet::new(),
        };

        Ok(users
            .iter()
            .map(|u| self.user_with(u, subscribed.contains(&u.id)))
            .collect())
    }

    #[must_use]
    pub fn short_recipe(&self, recipe: &recipes::Model) -> ShortRecipeDto {
        ShortRecipeDto {
            id: recipe.id,
            name: recipe.name.clone(),
            image: self.images.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }

    pub async fn recipe(&self, viewer: &Caller, recipe: recipes::Model) -> Result<RecipeDto> {
        self.recipes(viewer, vec![recipe])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Recipe representation missing"))
    }

    /// Builds full recipe representations with a fixed number of queries
    /// regardless of how many recipes are passed.
    pub async fn recipes(
        &self,
        viewer: &Caller,
        recipes: Vec<recipes::Model>,
    ) -> Result<Vec<RecipeDto>> {
        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors = self.store.get_users(&author_ids).await?;
        let authors: HashMap<i32, UserDto> = self
            .users(viewer, &authors)
            .await?
            .into_iter()
            .map(|dto| (dto.base.id, dto))
            .collect();

        let mut ingredients: HashMap<i32, Vec<RecipeIngredientDto>> = HashMap::new();
        for row in self.store.recipe_ingredients(&recipe_ids).await? {
            ingredients
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientDto {
                    id: row.ingredient_id,
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                });
        }

        let (favorited, in_cart) = match viewer.user_id() {
            Some(user_id) => (
                self.store
                    .relation_members(RelationKind::Favorite, user_id, &recipe_ids)
                    .await?,
                self.store
                    .relation_members(RelationKind::ShoppingCart, user_id, &recipe_ids)
                    .await?,
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors
                    .get(&recipe.author_id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("Author {} missing", recipe.author_id))?;

                Ok(RecipeDto {
                    id: recipe.id,
                    author,
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    image: self.images.url(&recipe.image),
                    name: recipe.name,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    /// Followed authors are always rendered as subscribed.
    pub async fn subscription(
        &self,
        author: &User,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto> {
        let recipes = self
            .store
            .list_recipes_by_author(author.id, recipes_limit)
            .await?;
        let recipes_count = self.store.count_recipes_by_author(author.id).await?;

        Ok(SubscriptionDto {
            user: self.user_with(author, true),
            recipes: recipes.iter().map(|r| self.short_recipe(r)).collect(),
            recipes_count,
        })
    }
}
