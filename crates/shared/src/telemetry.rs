use crate::errors::{AppError, ErrorSeverity};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
/// 構造化ログ（JSON）で出力し、レベルは `RUST_LOG` で制御する
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).json())
        .with(EnvFilter::from_default_env())
        .try_init()?;

    Ok(())
}

/// HTTP リクエストの完了を記録
pub fn trace_http_request(method: &str, path: &str, status_code: u16, user_id: Option<&str>) {
    if status_code >= 400 {
        warn!(
            method = method,
            path = path,
            status_code = status_code,
            user_id = user_id,
            "HTTP request failed"
        );
    } else {
        info!(
            method = method,
            path = path,
            status_code = status_code,
            user_id = user_id,
            "HTTP request completed"
        );
    }
}

/// エラーを重要度に応じたレベルで記録
pub fn log_error(err: &AppError, context: &str) {
    let metadata = err.metadata();

    match metadata.severity {
        ErrorSeverity::Critical | ErrorSeverity::Error => {
            error!(
                error = %err,
                code = metadata.code,
                category = ?metadata.category,
                context = context,
                "Error occurred"
            );
        }
        ErrorSeverity::Warning => {
            warn!(
                error = %err,
                code = metadata.code,
                category = ?metadata.category,
                context = context,
                "Warning occurred"
            );
        }
        ErrorSeverity::Info => {
            info!(
                error = %err,
                code = metadata.code,
                category = ?metadata.category,
                context = context,
                "Client error"
            );
        }
    }
}
