use serde::{Deserialize, Serialize};
use thiserror::Error;

/// アプリケーション全体で使用されるエラー型
#[derive(Debug, Clone, Error)]
pub enum AppError {
    // ドメインエラー
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    // インフラストラクチャエラー
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // 認証エラー
    #[error("Authentication failed: {0}")]
    Authentication(String),

    // ビジネスロジックエラー
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // システムエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// クライアントエラー（4xx相当）
    Client,
    /// サーバーエラー（5xx相当）
    Server,
}

/// エラーの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// エラーメタデータ
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
}

impl AppError {
    pub fn metadata(&self) -> ErrorMetadata {
        let (code, category, severity) = match self {
            AppError::Domain(_) => ("DOMAIN_ERROR", ErrorCategory::Client, ErrorSeverity::Info),
            AppError::Validation(_) => (
                "VALIDATION_ERROR",
                ErrorCategory::Client,
                ErrorSeverity::Info,
            ),
            AppError::Deserialization(_) => (
                "INVALID_REQUEST_BODY",
                ErrorCategory::Client,
                ErrorSeverity::Info,
            ),
            AppError::Authentication(_) => (
                "AUTHENTICATION_ERROR",
                ErrorCategory::Client,
                ErrorSeverity::Warning,
            ),
            AppError::NotFound(_) => ("NOT_FOUND", ErrorCategory::Client, ErrorSeverity::Info),
            AppError::DynamoDb(_) => (
                "DYNAMODB_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Error,
            ),
            AppError::Serialization(_) => (
                "SERIALIZATION_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Error,
            ),
            AppError::Configuration(_) => (
                "CONFIGURATION_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Critical,
            ),
            AppError::Internal(_) => (
                "INTERNAL_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Critical,
            ),
        };

        ErrorMetadata {
            code,
            category,
            severity,
        }
    }

    /// HTTPステータスコードを取得
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Authentication(_) => 401,
            AppError::Domain(_) | AppError::Validation(_) | AppError::Deserialization(_) => 400,
            _ => 500,
        }
    }

    /// ユーザー向けメッセージを取得
    ///
    /// サーバーエラーは内部情報を返さず `fallback` を使う。
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Domain(e) => e.message().to_string(),
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Deserialization(_) => "Invalid JSON body".to_string(),
            AppError::Authentication(_) => "Unauthorized".to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Deserialization(e.to_string())
    }
}

/// エラーレスポンスボディ `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn from_app_error(error: &AppError, fallback: &str) -> Self {
        Self::new(error.user_message(fallback))
    }
}
