use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid UserId: {0}")]
    InvalidUserId(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// 利用者向けの検証メッセージ（接頭辞なし）
    pub fn message(&self) -> &str {
        match self {
            DomainError::InvalidTodoId(msg)
            | DomainError::InvalidUserId(msg)
            | DomainError::Validation(msg) => msg,
        }
    }
}
