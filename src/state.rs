use std::sync::Arc;

use crate::clients::{EdamamClient, FoodProvider};
use crate::config::Config;
use crate::db::Store;
use crate::services::{CacheCoordinator, FoodService, RetentionPolicy};

/// Everything a command or the daemon needs, built once from config.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub service: Arc<dyn FoodService>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn FoodProvider> = Arc::new(EdamamClient::new(&config.provider)?);
        Self::with_provider(config, provider).await
    }

    /// Same wiring with a caller-supplied provider.
    pub async fn with_provider(
        config: Config,
        provider: Arc<dyn FoodProvider>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let service: Arc<dyn FoodService> = Arc::new(CacheCoordinator::new(
            store.clone(),
            provider,
            RetentionPolicy::from_config(&config.cache),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            service,
        })
    }
}
