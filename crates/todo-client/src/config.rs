use shared::AppError;
use std::env;
use std::time::Duration;

/// エラー通知の表示時間
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API のベースURL（末尾スラッシュなし）
    pub api_base_url: String,
    pub notification_duration: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            lookup("TODO_API_BASE_URL").unwrap_or_else(|| "http://localhost:3000/api".to_string()),
        );

        if let Some(ms) = lookup("TODO_NOTIFICATION_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                AppError::Configuration(format!("invalid TODO_NOTIFICATION_MS: {ms}"))
            })?;
            config.notification_duration = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000/api")
    }
}
