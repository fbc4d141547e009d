use anyhow::Result;
use chrono::SecondsFormat;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::RelationKind;
use crate::entities::{ingredients, recipes};
use crate::models::recipe::{NewRecipe, RecipeChanges, RecipeIngredientRow, ShoppingListItem};
use crate::models::user::{NewUser, User};

pub mod migrator;
pub mod repositories;

pub use repositories::recipe::RecipeQuery;

/// RFC 3339 UTC with microseconds, so string order is chronological.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Each pooled connection to `:memory:` would open its own empty database.
        if in_memory {
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn relation_repo(&self) -> repositories::relation::RelationRepository {
        repositories::relation::RelationRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_users(&self, ids: &[i32]) -> Result<Vec<User>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn create_user(&self, user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, security).await
    }

    pub async fn list_users(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64)> {
        self.user_repo().list_page(offset, limit).await
    }

    pub async fn set_user_avatar(&self, id: i32, avatar: Option<String>) -> Result<()> {
        self.user_repo().set_avatar(id, avatar).await
    }

    pub async fn verify_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn get_or_create_token(&self, user_id: i32) -> Result<String> {
        self.token_repo().get_or_create(user_id).await
    }

    pub async fn user_for_token(&self, key: &str) -> Result<Option<User>> {
        self.token_repo().user_for_key(key).await
    }

    pub async fn delete_token(&self, user_id: i32) -> Result<()> {
        self.token_repo().delete_for_user(user_id).await
    }

    pub async fn search_ingredients(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        self.ingredient_repo().search(prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().get(id).await
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        self.ingredient_repo().existing_ids(ids).await
    }

    pub async fn import_ingredients(&self, rows: Vec<(String, String)>) -> Result<u64> {
        self.ingredient_repo().get_or_create_many(rows).await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<recipes::Model>> {
        self.recipe_repo().get(id).await
    }

    pub async fn list_recipes(
        &self,
        query: RecipeQuery,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<recipes::Model>, u64)> {
        self.recipe_repo().list_page(query, offset, limit).await
    }

    pub async fn list_recipes_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        self.recipe_repo().list_by_author(author_id, limit).await
    }

    pub async fn count_recipes_by_author(&self, author_id: i32) -> Result<u64> {
        self.recipe_repo().count_by_author(author_id).await
    }

    pub async fn recipe_ingredients(&self, recipe_ids: &[i32]) -> Result<Vec<RecipeIngredientRow>> {
        self.recipe_repo().ingredients_for(recipe_ids).await
    }

    pub async fn create_recipe(&self, recipe: NewRecipe) -> Result<recipes::Model> {
        self.recipe_repo().create(recipe).await
    }

    pub async fn update_recipe(&self, id: i32, changes: RecipeChanges) -> Result<recipes::Model> {
        self.recipe_repo().update(id, changes).await
    }

    pub async fn delete_recipe(&self, id: i32) -> Result<()> {
        self.recipe_repo().delete(id).await
    }

    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>> {
        self.recipe_repo().shopping_list(user_id).await
    }

    pub async fn add_relation(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.relation_repo().add(kind, user_id, recipe_id).await
    }

    pub async fn remove_relation(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.relation_repo().remove(kind, user_id, recipe_id).await
    }

    pub async fn relation_members(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        self.relation_repo()
            .contains_many(kind, user_id, recipe_ids)
            .await
    }

    pub async fn count_relation(&self, kind: RelationKind, user_id: i32) -> Result<u64> {
        self.relation_repo().count(kind, user_id).await
    }

    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().add(user_id, author_id).await
    }

    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().remove(user_id, author_id).await
    }

    pub async fn subscribed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        self.subscription_repo()
            .subscribed_among(user_id, author_ids)
            .await
    }

    pub async fn list_subscribed_authors(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64)> {
        self.subscription_repo()
            .list_authors_page(user_id, offset, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::IngredientAmount;

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    async fn user(store: &Store, name: &str) -> User {
        store
            .create_user(
                NewUser {
                    username: name.to_string(),
                    email: format!("{name}@example.com"),
                    first_name: "First".to_string(),
                    last_name: "Last".to_string(),
                    password: "secret-pass".to_string(),
                },
                &SecurityConfig {
                    argon2_memory_cost_kib: 1024,
                    argon2_time_cost: 1,
                    argon2_parallelism: 1,
                },
            )
            .await
            .unwrap()
    }

    async fn recipe(store: &Store, author_id: i32, items: &[(i32, i32)]) -> recipes::Model {
        store
            .create_recipe(NewRecipe {
                author_id,
                name: "Soup".to_string(),
                text: "Boil".to_string(),
                image: "recipes/soup.png".to_string(),
                cooking_time: 10,
                ingredients: items
                    .iter()
                    .map(|&(ingredient_id, amount)| IngredientAmount {
                        ingredient_id,
                        amount,
                    })
                    .collect(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ingredient_search_is_a_literal_prefix_match() {
        let store = store().await;
        store
            .import_ingredients(vec![
                ("Sugar".to_string(), "g".to_string()),
                ("sugar syrup".to_string(), "ml".to_string()),
                ("Brown sugar".to_string(), "g".to_string()),
                ("S_lt".to_string(), "g".to_string()),
                ("Salt".to_string(), "g".to_string()),
            ])
            .await
            .unwrap();

        let names = |rows: Vec<ingredients::Model>| -> Vec<String> {
            rows.into_iter().map(|i| i.name).collect()
        };

        assert_eq!(
            names(store.search_ingredients(Some("Sug")).await.unwrap()),
            vec!["Sugar"]
        );
        assert_eq!(
            names(store.search_ingredients(Some("S_")).await.unwrap()),
            vec!["S_lt"]
        );
        assert_eq!(store.search_ingredients(None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn import_skips_existing_pairs() {
        let store = store().await;
        let first = store
            .import_ingredients(vec![
                ("Egg".to_string(), "pcs".to_string()),
                ("Milk".to_string(), "ml".to_string()),
            ])
            .await
            .unwrap();
        let second = store
            .import_ingredients(vec![
                ("Egg".to_string(), "pcs".to_string()),
                ("Egg".to_string(), "g".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn relation_add_twice_keeps_one_row() {
        let store = store().await;
        let author = user(&store, "author").await;
        store
            .import_ingredients(vec![("Egg".to_string(), "pcs".to_string())])
            .await
            .unwrap();
        let recipe = recipe(&store, author.id, &[(1, 2)]).await;

        assert!(
            store
                .add_relation(RelationKind::Favorite, author.id, recipe.id)
                .await
                .unwrap()
        );
        assert!(
            !store
                .add_relation(RelationKind::Favorite, author.id, recipe.id)
                .await
                .unwrap()
        );
        assert_eq!(
            store
                .count_relation(RelationKind::Favorite, author.id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count_relation(RelationKind::ShoppingCart, author.id)
                .await
                .unwrap(),
            0
        );

        assert!(
            store
                .remove_relation(RelationKind::Favorite, author.id, recipe.id)
                .await
                .unwrap()
        );
        assert!(
            !store
                .remove_relation(RelationKind::Favorite, author.id, recipe.id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn shopping_list_sums_per_name_and_unit() {
        let store = store().await;
        let author = user(&store, "cook").await;
        store
            .import_ingredients(vec![
                ("Salt".to_string(), "g".to_string()),
                ("Flour".to_string(), "g".to_string()),
            ])
            .await
            .unwrap();

        let first = recipe(&store, author.id, &[(1, 10), (2, 200)]).await;
        let second = recipe(&store, author.id, &[(1, 5)]).await;
        let third = recipe(&store, author.id, &[(2, 1000)]).await;

        for id in [first.id, second.id] {
            store
                .add_relation(RelationKind::ShoppingCart, author.id, id)
                .await
                .unwrap();
        }
        store
            .add_relation(RelationKind::Favorite, author.id, third.id)
            .await
            .unwrap();

        let list = store.shopping_list(author.id).await.unwrap();
        assert_eq!(
            list,
            vec![
                ShoppingListItem {
                    name: "Flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 200,
                },
                ShoppingListItem {
                    name: "Salt".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 15,
                },
            ]
        );
    }

    #[tokio::test]
    async fn update_replaces_ingredient_rows() {
        let store = store().await;
        let author = user(&store, "chef").await;
        store
            .import_ingredients(vec![
                ("Egg".to_string(), "pcs".to_string()),
                ("Milk".to_string(), "ml".to_string()),
            ])
            .await
            .unwrap();
        let recipe = recipe(&store, author.id, &[(1, 2), (2, 100)]).await;

        let updated = store
            .update_recipe(
                recipe.id,
                RecipeChanges {
                    cooking_time: Some(25),
                    ingredients: vec![IngredientAmount {
                        ingredient_id: 2,
                        amount: 50,
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.cooking_time, 25);
        assert_eq!(updated.name, "Soup");
        let rows = store.recipe_ingredients(&[recipe.id]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Milk");
        assert_eq!(rows[0].amount, 50);
    }

    #[tokio::test]
    async fn subscription_listing_follows_direction() {
        let store = store().await;
        let reader = user(&store, "reader").await;
        let writer = user(&store, "writer").await;

        assert!(store.subscribe(reader.id, writer.id).await.unwrap());
        assert!(!store.subscribe(reader.id, writer.id).await.unwrap());

        let (authors, total) = store.list_subscribed_authors(reader.id, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(authors[0].username, "writer");

        let (authors, total) = store.list_subscribed_authors(writer.id, 0, 10).await.unwrap();
        assert_eq!(total, 0);
        assert!(authors.is_empty());
    }
}
