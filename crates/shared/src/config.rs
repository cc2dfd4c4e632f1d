use crate::errors::AppError;
use std::env;

/// データストアの実装種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    /// ローカル開発用のプロセス内ストア
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Configuration(format!(
                "unknown STORE_BACKEND: {other}"
            ))),
        }
    }
}

/// OAuth（認可コードフロー）設定
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub authorize_endpoint: String,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub identity_provider: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub dynamodb_table: String,
    pub environment: String,
    pub aws_region: String,
    pub dynamodb_endpoint: Option<String>,
    pub store_backend: StoreBackend,
    /// リダイレクト先の組み立てに使うフロントエンドのオリジン
    pub app_origin: String,
    pub oauth: OAuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テストでは環境変数を汚さない）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_backend = StoreBackend::parse(&get("STORE_BACKEND", "dynamodb"))?;
        let app_origin = get("APP_ORIGIN", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            dynamodb_table: get("DYNAMODB_TABLE", "todo-list-dev"),
            environment: get("ENVIRONMENT", "dev"),
            aws_region: get("AWS_REGION", "ap-northeast-1"),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT"),
            store_backend,
            app_origin,
            oauth: OAuthConfig {
                authorize_endpoint: get(
                    "OAUTH_AUTHORIZE_ENDPOINT",
                    "http://localhost:9000/oauth2/authorize",
                ),
                token_endpoint: get("OAUTH_TOKEN_ENDPOINT", "http://localhost:9000/oauth2/token"),
                client_id: get("OAUTH_CLIENT_ID", "todo-list-local"),
                client_secret: lookup("OAUTH_CLIENT_SECRET"),
                identity_provider: get("OAUTH_IDENTITY_PROVIDER", "Google"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.dynamodb_table, "todo-list-dev");
        assert_eq!(config.environment, "dev");
        assert_eq!(config.store_backend, StoreBackend::DynamoDb);
        assert_eq!(config.app_origin, "http://localhost:3000");
        assert_eq!(config.oauth.identity_provider, "Google");
        assert!(config.dynamodb_endpoint.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "Memory"),
            ("APP_ORIGIN", "https://yourlist.space/"),
            ("OAUTH_CLIENT_SECRET", "secret"),
            ("ENVIRONMENT", "prod"),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.app_origin, "https://yourlist.space");
        assert_eq!(config.oauth.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.environment, "prod");
    }

    #[test]
    fn test_invalid_store_backend() {
        let result = Config::from_lookup(lookup_from(&[("STORE_BACKEND", "redis")]));

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
