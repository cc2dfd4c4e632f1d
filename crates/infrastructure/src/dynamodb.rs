use aws_sdk_dynamodb::Client;
use shared::Config;
use tracing::info;

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    /// 設定からクライアントを生成
    /// `DYNAMODB_ENDPOINT` が指定されていればローカルの DynamoDB に接続する
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));

        if let Some(endpoint) = &config.dynamodb_endpoint {
            info!("DynamoDBエンドポイントを上書き: {}", endpoint);
            loader = loader.endpoint_url(endpoint.clone());
        }

        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}
