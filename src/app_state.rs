use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::TaskError;
use crate::service::TaskService;
use crate::store::{MemoryStore, MongoStore, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub config: Config,
}

impl AppState {
    /// Opens the configured store. Called once at startup; the store is
    /// released through [`AppState::shutdown`].
    pub async fn init(config: Config) -> Result<Self, TaskError> {
        let store: Arc<dyn TaskStore> = match (config.store_backend, config.mongo_uri.as_deref()) {
            (StoreBackend::Mongo, Some(uri)) => {
                Arc::new(MongoStore::connect(uri, &config.database_name).await?)
            }
            (StoreBackend::Mongo, None) => {
                return Err(TaskError::ConflictOrTransient("MONGO_URI must be set".to_string()))
            }
            (StoreBackend::Memory, _) => Arc::new(MemoryStore::new()),
        };
        Ok(Self {
            tasks: TaskService::new(store),
            config,
        })
    }

    pub async fn shutdown(&self) {
        self.tasks.store().shutdown().await;
    }
}
