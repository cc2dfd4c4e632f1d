use crate::models::{ApiGatewayProxyResponse, CreateTodoRequest, MessageResponse};
use crate::responses::create_success_response;
use chrono::Utc;
use domain::{NewTodo, Todo, TodoId, TodoPatch, UserId};
use infrastructure::{SortOrder, TodoStore};
use serde::de::DeserializeOwned;
use shared::AppError;
use tracing::info;

/// リクエストボディをパース（空ボディは `{}` として扱う）
fn parse_body<T: DeserializeOwned>(body: Option<&str>) -> Result<T, AppError> {
    match body.map(str::trim) {
        None | Some("") => Ok(serde_json::from_str("{}")?),
        Some(json) => Ok(serde_json::from_str(json)?),
    }
}

/// GET /todos
pub async fn list_todos(
    store: &dyn TodoStore,
    owner: &UserId,
    order: SortOrder,
) -> Result<ApiGatewayProxyResponse, AppError> {
    let todos = store.list(owner, order).await?;

    info!("ToDo一覧取得完了: {} 件", todos.len());
    create_success_response(200, &todos)
}

/// POST /todos
pub async fn create_todo(
    store: &dyn TodoStore,
    owner: &UserId,
    body: Option<&str>,
) -> Result<ApiGatewayProxyResponse, AppError> {
    let input: CreateTodoRequest = parse_body(body)?;

    let new_todo = NewTodo {
        title: input.title.unwrap_or_default(),
        description: input.description,
    };
    new_todo.validate()?;

    let todo = Todo::create(owner.clone(), new_todo, Utc::now());
    store.insert(&todo).await?;

    info!("ToDo作成完了: todo_id={}", todo.id);
    create_success_response(201, &todo)
}

/// PUT|PATCH /todos/{id}
pub async fn update_todo(
    store: &dyn TodoStore,
    owner: &UserId,
    todo_id: &TodoId,
    body: Option<&str>,
) -> Result<ApiGatewayProxyResponse, AppError> {
    let patch: TodoPatch = parse_body(body)?;

    if patch.is_empty() {
        return Err(AppError::Validation(
            "At least one of 'title', 'description' or 'completed' is required".to_string(),
        ));
    }
    patch.validate()?;

    let todo = store.update(owner, todo_id, &patch, Utc::now()).await?;

    info!("ToDo更新完了: todo_id={}", todo.id);
    create_success_response(200, &todo)
}

/// DELETE /todos/{id}
pub async fn delete_todo(
    store: &dyn TodoStore,
    owner: &UserId,
    todo_id: &TodoId,
) -> Result<ApiGatewayProxyResponse, AppError> {
    store.delete(owner, todo_id).await?;

    info!("ToDo削除完了: todo_id={}", todo_id);
    create_success_response(
        200,
        &MessageResponse {
            message: "Todo deleted successfully".to_string(),
        },
    )
}
