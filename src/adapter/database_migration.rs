use sqlx::{MySql, Pool};
use tracing::info;
use crate::adapter::database_error::DatabaseError;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        let migrations = [
            include_str!("../../migrations/001_create_users_table.sql"),
            include_str!("../../migrations/002_create_events_table.sql"),
            include_str!("../../migrations/003_create_bookings_table.sql"),
        ];

        for (index, migration_sql) in migrations.iter().enumerate() {
            let number = index + 1;
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", number, e))
                })?;
            info!(migration = number, "migration completed");
        }

        info!("all migrations completed");
        Ok(())
    }
}
