use anyhow::Context;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{init_tracing, Config};
use todo_api::{route, ApiGatewayProxyRequest, ApiGatewayProxyResponse, AppState};
use tracing::info;

/// ToDo API のメイン関数
async fn function_handler(
    event: LambdaEvent<ApiGatewayProxyRequest>,
    state: &AppState,
) -> Result<ApiGatewayProxyResponse, Error> {
    let (payload, context) = event.into_parts();

    info!(request_id = %context.request_id, "ToDo API開始");
    Ok(route(payload, state).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;

    let config = Config::from_env().context("設定の読み込みに失敗しました")?;
    info!(
        environment = %config.environment,
        backend = ?config.store_backend,
        "ToDo API Lambda を開始中..."
    );

    let state = AppState::from_config(config)
        .await
        .context("依存関係の初期化に失敗しました")?;

    run(service_fn(move |event: LambdaEvent<ApiGatewayProxyRequest>| {
        let state = state.clone();
        async move { function_handler(event, &state).await }
    }))
    .await
}
