use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Role, UserId, UserProfile};
use crate::domain::port::{RepositoryError, UserDirectory};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQLユーザーディレクトリ
/// usersテーブルのプロフィールを参照・更新する
#[derive(Clone)]
pub struct MySqlUserDirectory {
    pool: Pool<MySql>,
}

impl MySqlUserDirectory {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn query_error(context: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| RepositoryError::from(DatabaseError::from_sqlx(context, e))
}

fn profile_from_row(row: &MySqlRow) -> Result<UserProfile, RepositoryError> {
    let decode = query_error("ユーザー行の変換に失敗しました");

    let id: String = row.try_get("id").map_err(&decode)?;
    let role: String = row.try_get("role").map_err(&decode)?;

    let id = UserId::from_string(&id).map_err(|e| {
        RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
    })?;
    let role =
        Role::from_string(&role).map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;

    Ok(UserProfile {
        id,
        name: row.try_get("name").map_err(&decode)?,
        email: row.try_get("email").map_err(&decode)?,
        role,
    })
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email, role FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("ユーザーの取得に失敗しました"))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, email, role FROM users ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("ユーザー一覧の取得に失敗しました"))?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn update(&self, profile: &UserProfile) -> Result<bool, RepositoryError> {
        // メールアドレスの重複は一意制約違反として Conflict になる
        let result = sqlx::query("UPDATE users SET name = ?, email = ?, role = ? WHERE id = ?")
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(profile.role.as_str())
            .bind(profile.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error("ユーザーの更新に失敗しました"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // 値が変わらない更新は0行になるため存在を確認する
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(profile.id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("ユーザーの取得に失敗しました"))?;

        Ok(exists > 0)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error("ユーザーの削除に失敗しました"))?;

        Ok(result.rows_affected() > 0)
    }
}
