use anyhow::Context;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ImageService, RecipeService, Representer, SeaOrmRecipeService, SeaOrmSubscriptionService,
    SeaOrmUserService, SubscriptionService, UserService,
};

/// Long-lived collaborators shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub image_service: Arc<ImageService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub subscription_service: Arc<dyn SubscriptionService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires the services around an already opened store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let site_url = url::Url::parse(&config.server.public_url)
            .with_context(|| format!("Invalid public_url: {}", config.server.public_url))?;

        let image_service = Arc::new(ImageService::new(&config));
        let representer = Representer::new(store.clone(), image_service.clone());

        let recipe_service = Arc::new(SeaOrmRecipeService::new(
            store.clone(),
            image_service.clone(),
            representer.clone(),
            site_url,
        )) as Arc<dyn RecipeService>;

        let subscription_service = Arc::new(SeaOrmSubscriptionService::new(
            store.clone(),
            representer.clone(),
        )) as Arc<dyn SubscriptionService>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            image_service.clone(),
            representer,
            config.security.clone(),
        )) as Arc<dyn UserService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            image_service,
            recipe_service,
            subscription_service,
            user_service,
        })
    }
}
