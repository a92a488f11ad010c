use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    BookingStatus, Event, EventDetails, EventId, Money, TicketInventory, UserId,
};
use crate::domain::port::{EventRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const EVENT_COLUMNS: &str = "id, organizer_id, title, description, date, location, category, \
     images, ticket_price, total_tickets, remaining_tickets, created_at, updated_at";

/// MySQLイベントリポジトリ
/// MySQLデータベースを使用してイベントを永続化する
#[derive(Clone)]
pub struct MySqlEventRepository {
    pool: Pool<MySql>,
}

impl MySqlEventRepository {
    /// 新しいMySQLイベントリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn fetch_error(context: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| RepositoryError::from(DatabaseError::from_sqlx(context, e))
}

/// 取得した行をイベントに変換
fn event_from_row(row: &MySqlRow) -> Result<Event, RepositoryError> {
    let decode = fetch_error("イベント行の変換に失敗しました");

    let id: String = row.try_get("id").map_err(&decode)?;
    let organizer_id: String = row.try_get("organizer_id").map_err(&decode)?;
    let images: String = row.try_get("images").map_err(&decode)?;
    let date: NaiveDateTime = row.try_get("date").map_err(&decode)?;
    let created_at: NaiveDateTime = row.try_get("created_at").map_err(&decode)?;
    let updated_at: NaiveDateTime = row.try_get("updated_at").map_err(&decode)?;

    let id = EventId::from_string(&id)
        .map_err(|e| RepositoryError::FetchFailed(format!("イベントIDの解析に失敗しました: {}", e)))?;
    let organizer_id = UserId::from_string(&organizer_id)
        .map_err(|e| RepositoryError::FetchFailed(format!("主催者IDの解析に失敗しました: {}", e)))?;
    let images: Vec<String> = serde_json::from_str(&images)
        .map_err(|e| RepositoryError::FetchFailed(format!("画像一覧の解析に失敗しました: {}", e)))?;
    let ticket_price = Money::new(row.try_get("ticket_price").map_err(&decode)?)
        .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;
    let inventory = TicketInventory::reconstruct(
        row.try_get("total_tickets").map_err(&decode)?,
        row.try_get("remaining_tickets").map_err(&decode)?,
    )
    .map_err(|e| RepositoryError::FetchFailed(e.to_string()))?;

    let details = EventDetails {
        title: row.try_get("title").map_err(&decode)?,
        description: row.try_get("description").map_err(&decode)?,
        date: date.and_utc(),
        location: row.try_get("location").map_err(&decode)?,
        category: row.try_get("category").map_err(&decode)?,
        images,
    };

    Ok(Event::reconstruct(
        id,
        organizer_id,
        details,
        ticket_price,
        inventory,
        created_at.and_utc(),
        updated_at.and_utc(),
    ))
}

fn images_json(event: &Event) -> Result<String, RepositoryError> {
    serde_json::to_string(&event.details().images)
        .map_err(|e| RepositoryError::OperationFailed(format!("画像一覧の変換に失敗しました: {}", e)))
}

#[async_trait]
impl EventRepository for MySqlEventRepository {
    async fn insert(&self, event: &Event) -> Result<(), RepositoryError> {
        let details = event.details();
        sqlx::query(
            r#"
            INSERT INTO events (
                id, organizer_id, title, description, date, location, category, images,
                ticket_price, total_tickets, remaining_tickets, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id().to_string())
        .bind(event.organizer_id().to_string())
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.date.naive_utc())
        .bind(&details.location)
        .bind(&details.category)
        .bind(images_json(event)?)
        .bind(event.ticket_price().amount())
        .bind(event.total_tickets())
        .bind(event.remaining_tickets())
        .bind(event.created_at().naive_utc())
        .bind(event.updated_at().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(fetch_error("イベントの保存に失敗しました"))?;

        Ok(())
    }

    async fn update_details(&self, event: &Event) -> Result<bool, RepositoryError> {
        // チケット数の列は更新しない
        let details = event.details();
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, date = ?, location = ?, category = ?,
                images = ?, ticket_price = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.date.naive_utc())
        .bind(&details.location)
        .bind(&details.category)
        .bind(images_json(event)?)
        .bind(event.ticket_price().amount())
        .bind(event.updated_at().naive_utc())
        .bind(event.id().to_string())
        .execute(&self.pool)
        .await
        .map_err(fetch_error("イベントの更新に失敗しました"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, event_id: EventId) -> Result<Option<Event>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(event_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(fetch_error("イベントの取得に失敗しました"))?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(fetch_error("イベント一覧の取得に失敗しました"))?;

        rows.iter().map(event_from_row).collect()
    }

    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE organizer_id = ? ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .bind(organizer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(fetch_error("主催者のイベント一覧の取得に失敗しました"))?;

        rows.iter().map(event_from_row).collect()
    }

    async fn delete_if_no_active_bookings(
        &self,
        event_id: EventId,
    ) -> Result<bool, RepositoryError> {
        // 有効な予約の確認と削除を1つの文で行う
        let result = sqlx::query(
            r#"
            DELETE FROM events
            WHERE id = ?
              AND NOT EXISTS (
                  SELECT 1 FROM bookings WHERE event_id = ? AND status <> ?
              )
            "#,
        )
        .bind(event_id.to_string())
        .bind(event_id.to_string())
        .bind(BookingStatus::Canceled.as_str())
        .execute(&self.pool)
        .await
        .map_err(fetch_error("イベントの削除に失敗しました"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE id = ?")
            .bind(event_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("イベントの取得に失敗しました"))?;

        if remaining > 0 {
            return Err(RepositoryError::Conflict(
                "有効な予約が残っているため削除できません".to_string(),
            ));
        }
        Ok(false)
    }

    fn next_identity(&self) -> EventId {
        EventId::new()
    }
}
