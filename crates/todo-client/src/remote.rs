use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use shared::Session;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Todo not found")]
    NotFound,

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

/// ToDo API へのポート
///
/// すべての操作はセッションの利用者に限定される。
#[async_trait]
pub trait TodoRemote: Send + Sync {
    /// 作成日時の昇順で取得
    async fn fetch_todos(&self, session: &Session) -> Result<Vec<Todo>, RemoteError>;

    async fn create_todo(&self, session: &Session, input: &NewTodo) -> Result<Todo, RemoteError>;

    async fn update_todo(
        &self,
        session: &Session,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> Result<Todo, RemoteError>;

    async fn delete_todo(&self, session: &Session, id: &TodoId) -> Result<(), RemoteError>;
}
