use crate::remote::RemoteError;
use domain::DomainError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// 入力検証エラー。通信もキャッシュ変更も行われていない。
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl MutationError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MutationError::Remote(RemoteError::Unauthorized))
    }
}
