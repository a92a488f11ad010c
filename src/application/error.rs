use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// ドメインエラーとリポジトリエラーをラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 呼び出し元に権限がない
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 条件付き更新が競合に負けた
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),
    /// 現在の状態では実行できない操作
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => ApplicationError::PersistenceConflict(msg),
            other => ApplicationError::RepositoryError(other),
        }
    }
}
