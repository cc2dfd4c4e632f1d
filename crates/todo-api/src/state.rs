use crate::oauth::{IdentityProvider, OAuthCodeExchanger};
use infrastructure::{DynamoDbClient, DynamoTodoStore, InMemoryTodoStore, TodoStore};
use shared::{AppError, Config, StoreBackend};
use std::sync::Arc;
use tracing::info;

/// ハンドラー間で共有する依存関係
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TodoStore>,
        identity: Arc<dyn IdentityProvider>,
        config: Config,
    ) -> Self {
        Self {
            store,
            identity,
            config: Arc::new(config),
        }
    }

    /// 設定に従って実装を選択し組み立てる
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let store: Arc<dyn TodoStore> = match config.store_backend {
            StoreBackend::DynamoDb => {
                info!("DynamoDBストアを使用: table={}", config.dynamodb_table);
                Arc::new(DynamoTodoStore::new(DynamoDbClient::new(&config).await))
            }
            StoreBackend::Memory => {
                info!("プロセス内ストアを使用");
                Arc::new(InMemoryTodoStore::new())
            }
        };

        let identity = Arc::new(OAuthCodeExchanger::new(config.oauth.clone())?);

        Ok(Self::new(store, identity, config))
    }
}
