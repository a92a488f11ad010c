use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    Booking, BookingId, BookingStatus, EventId, Money, TicketQuantity, UserId,
};
use crate::domain::port::{BookingRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use tracing::debug;

const BOOKING_COLUMNS: &str =
    "id, user_id, event_id, quantity, total_price, status, created_at, updated_at";

/// MySQL予約リポジトリ
/// 予約の保存とイベント在庫の更新を1つのトランザクションで行う
#[derive(Clone)]
pub struct MySqlBookingRepository {
    pool: Pool<MySql>,
}

impl MySqlBookingRepository {
    /// 新しいMySQL予約リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn query_error(context: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| RepositoryError::from(DatabaseError::from_sqlx(context, e))
}

fn booking_from_row(row: &MySqlRow) -> Result<Booking, RepositoryError> {
    let decode = query_error("予約行の変換に失敗しました");

    let id: String = row.try_get("id").map_err(&decode)?;
    let user_id: String = row.try_get("user_id").map_err(&decode)?;
    let event_id: String = row.try_get("event_id").map_err(&decode)?;
    let status: String = row.try_get("status").map_err(&decode)?;
    let created_at: NaiveDateTime = row.try_get("created_at").map_err(&decode)?;
    let updated_at: NaiveDateTime = row.try_get("updated_at").map_err(&decode)?;

    let id = BookingId::from_string(&id)
        .map_err(|e| RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e)))?;
    let user_id = UserId::from_string(&user_id)
        .map_err(|e| RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e)))?;
    let event_id = EventId::from_string(&event_id)
        .map_err(|e| RepositoryError::FetchFailed(format!("イベントIDの解析に失敗しました: {}", e)))?;
    let quantity = TicketQuantity::new(row.try_get("quantity").map_err(&decode)?)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let total_price = Money::new(row.try_get("total_price").map_err(&decode)?)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let status = BookingStatus::from_string(&status)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;

    Ok(Booking::reconstruct(
        id,
        user_id,
        event_id,
        quantity,
        total_price,
        status,
        created_at.and_utc(),
        updated_at.and_utc(),
    ))
}

#[async_trait]
impl BookingRepository for MySqlBookingRepository {
    async fn reserve(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_error("トランザクションの開始に失敗しました"))?;

        // 残りチケット数が足りる場合のみ減算する
        let decremented = sqlx::query(
            r#"
            UPDATE events
            SET remaining_tickets = remaining_tickets - ?, updated_at = ?
            WHERE id = ? AND remaining_tickets >= ?
            "#,
        )
        .bind(booking.quantity().value())
        .bind(booking.created_at().naive_utc())
        .bind(booking.event_id().to_string())
        .bind(booking.quantity().value())
        .execute(&mut *tx)
        .await
        .map_err(query_error("在庫の減算に失敗しました"))?;

        if decremented.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(query_error("ロールバックに失敗しました"))?;
            debug!(event_id = %booking.event_id(), "conditional decrement matched no row");
            return Err(RepositoryError::Conflict(format!(
                "イベント{}の残りチケット数が{}枚未満です",
                booking.event_id(),
                booking.quantity()
            )));
        }

        // 挿入に失敗した場合はトランザクションの破棄で減算も取り消される
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, event_id, quantity, total_price, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.id().to_string())
        .bind(booking.user_id().to_string())
        .bind(booking.event_id().to_string())
        .bind(booking.quantity().value())
        .bind(booking.total_price().amount())
        .bind(booking.status().as_str())
        .bind(booking.created_at().naive_utc())
        .bind(booking.updated_at().naive_utc())
        .execute(&mut *tx)
        .await
        .map_err(query_error("予約の保存に失敗しました"))?;

        tx.commit()
            .await
            .map_err(query_error("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn cancel(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_error("トランザクションの開始に失敗しました"))?;

        let canceled = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, updated_at = ?
            WHERE id = ? AND status <> ?
            "#,
        )
        .bind(BookingStatus::Canceled.as_str())
        .bind(booking.updated_at().naive_utc())
        .bind(booking.id().to_string())
        .bind(BookingStatus::Canceled.as_str())
        .execute(&mut *tx)
        .await
        .map_err(query_error("予約のキャンセルに失敗しました"))?;

        if canceled.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(query_error("ロールバックに失敗しました"))?;
            return Err(RepositoryError::Conflict(format!(
                "予約{}は既にキャンセルされています",
                booking.id()
            )));
        }

        // 総チケット数を超えない場合のみ加算する
        let released = sqlx::query(
            r#"
            UPDATE events
            SET remaining_tickets = remaining_tickets + ?, updated_at = ?
            WHERE id = ? AND remaining_tickets + ? <= total_tickets
            "#,
        )
        .bind(booking.quantity().value())
        .bind(booking.updated_at().naive_utc())
        .bind(booking.event_id().to_string())
        .bind(booking.quantity().value())
        .execute(&mut *tx)
        .await
        .map_err(query_error("在庫の加算に失敗しました"))?;

        if released.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(query_error("ロールバックに失敗しました"))?;
            return Err(RepositoryError::Conflict(format!(
                "イベント{}に{}枚を戻すと総チケット数を超えます",
                booking.event_id(),
                booking.quantity()
            )));
        }

        tx.commit()
            .await
            .map_err(query_error("トランザクションのコミットに失敗しました"))?;
        Ok(())
    }

    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(booking_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("予約の取得に失敗しました"))?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE user_id = ? ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("予約一覧の取得に失敗しました"))?;

        rows.iter().map(booking_from_row).collect()
    }

    fn next_identity(&self) -> BookingId {
        BookingId::new()
    }
}
