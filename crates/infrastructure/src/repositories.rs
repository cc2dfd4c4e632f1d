use crate::models::{item_to_todo, todo_to_item, DynamoDbKeys, Item};
use crate::DynamoDbClient;
use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId, TodoPatch, UserId};
use shared::AppError;
use thiserror::Error;
use tracing::{debug, error, info};

/// 作成日時による並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt item: {0}")]
    Corrupt(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::NotFound("Todo not found".to_string()),
            StoreError::Backend(msg) => AppError::DynamoDb(msg),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
        }
    }
}

/// ToDo の永続化ポート
///
/// すべての操作は所有者 (`UserId`) で絞り込まれる。他ユーザーのレコードは
/// 存在しないものとして扱う。
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self, owner: &UserId, order: SortOrder) -> Result<Vec<Todo>, StoreError>;

    async fn insert(&self, todo: &Todo) -> Result<(), StoreError>;

    /// 指定フィールドを更新し、更新後のレコードを返す
    async fn update(
        &self,
        owner: &UserId,
        id: &TodoId,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, StoreError>;

    /// 存在しないIDの削除は成功扱い
    async fn delete(&self, owner: &UserId, id: &TodoId) -> Result<(), StoreError>;
}

/// DynamoDB 実装
#[derive(Clone)]
pub struct DynamoTodoStore {
    db: DynamoDbClient,
}

impl DynamoTodoStore {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    fn parse_items(items: &[Item]) -> Result<Vec<Todo>, StoreError> {
        items
            .iter()
            .map(|item| {
                item_to_todo(item).ok_or_else(|| {
                    let key = item
                        .get("SK")
                        .and_then(|v| v.as_s().ok())
                        .cloned()
                        .unwrap_or_default();
                    StoreError::Corrupt(key)
                })
            })
            .collect()
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn list(&self, owner: &UserId, order: SortOrder) -> Result<Vec<Todo>, StoreError> {
        let mut todos = Vec::new();
        let mut start_key: Option<Item> = None;

        // 1MB を超える結果はページングされるので最後まで辿る
        loop {
            let result = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(DynamoDbKeys::user_partition(owner)),
                )
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(DynamoDbKeys::TODO_PREFIX.to_string()),
                )
                .scan_index_forward(order == SortOrder::Ascending)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    error!("ToDo一覧取得エラー: {}", e);
                    StoreError::Backend(e.to_string())
                })?;

            todos.extend(Self::parse_items(result.items())?);

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(
            "ToDo一覧取得完了: user_id={}, count={}",
            owner,
            todos.len()
        );
        Ok(todos)
    }

    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .send()
            .await
            .map_err(|e| {
                error!("ToDo保存エラー: {}", e);
                StoreError::Backend(e.to_string())
            })?;

        info!("ToDo保存完了: todo_id={}", todo.id);
        Ok(())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &TodoId,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, StoreError> {
        let keys = DynamoDbKeys::for_todo(owner, id);

        let mut update_parts = vec!["updated_at = :updated_at"];
        let mut builder = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_values(":updated_at", AttributeValue::S(now.to_rfc3339()))
            .return_values(ReturnValue::AllNew);

        if let Some(title) = &patch.title {
            update_parts.push("title = :title");
            builder = builder.expression_attribute_values(":title", AttributeValue::S(title.clone()));
        }

        if let Some(description) = &patch.description {
            update_parts.push("description = :description");
            builder = builder.expression_attribute_values(
                ":description",
                AttributeValue::S(description.clone()),
            );
        }

        if let Some(completed) = patch.completed {
            update_parts.push("completed = :completed");
            builder =
                builder.expression_attribute_values(":completed", AttributeValue::Bool(completed));
        }

        let result = builder
            .update_expression(format!("SET {}", update_parts.join(", ")))
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                UpdateItemError::ConditionalCheckFailedException(_) => {
                    StoreError::NotFound(id.to_string())
                }
                other => {
                    error!("ToDo更新エラー: {}", other);
                    StoreError::Backend(other.to_string())
                }
            })?;

        let item = result
            .attributes()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        item_to_todo(item).ok_or_else(|| StoreError::Corrupt(id.to_string()))
    }

    async fn delete(&self, owner: &UserId, id: &TodoId) -> Result<(), StoreError> {
        let keys = DynamoDbKeys::for_todo(owner, id);

        self.db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .key("PK", AttributeValue::S(keys.pk))
            .key("SK", AttributeValue::S(keys.sk))
            .send()
            .await
            .map_err(|e| {
                error!("ToDo削除エラー: {}", e);
                StoreError::Backend(e.to_string())
            })?;

        info!("ToDo削除完了: todo_id={}", id);
        Ok(())
    }
}
