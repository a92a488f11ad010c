use crate::domain::port::RepositoryError;
use sqlx::error::ErrorKind;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// 取得した行の変換エラー
    #[error("Row decoding error: {0}")]
    DecodeError(String),
    /// 一意制約・外部キー制約の違反
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl DatabaseError {
    /// sqlxのエラーを文脈付きで分類する
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(format!("{}: {}", context, err))
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                DatabaseError::DecodeError(format!("{}: {}", context, err))
            }
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.kind(),
                    ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation
                ) =>
            {
                DatabaseError::ConstraintViolation(format!("{}: {}", context, err))
            }
            other => DatabaseError::QueryError(format!("{}: {}", context, other)),
        }
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) => RepositoryError::OperationFailed(msg),
            DatabaseError::DecodeError(msg) => RepositoryError::FetchFailed(msg),
            DatabaseError::ConstraintViolation(msg) => RepositoryError::Conflict(msg),
            DatabaseError::MigrationError(msg) => RepositoryError::OperationFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let err = DatabaseError::from_sqlx("予約の保存に失敗しました", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_constraint_violation_is_conflict() {
        let err = DatabaseError::ConstraintViolation("重複".to_string());
        assert_eq!(
            RepositoryError::from(err),
            RepositoryError::Conflict("重複".to_string())
        );
    }

    #[test]
    fn test_row_not_found_is_query_error() {
        let err = DatabaseError::from_sqlx("イベントの取得に失敗しました", sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::QueryError(msg) if msg.starts_with("イベントの取得")));
    }
}
