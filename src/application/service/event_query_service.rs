use crate::application::ApplicationError;
use crate::domain::model::{Event, EventId, UserId};
use crate::domain::port::EventRepository;
use std::sync::Arc;

/// イベントクエリサービス
/// 読み取り専用のイベント操作を提供する
pub struct EventQueryService {
    event_repository: Arc<dyn EventRepository>,
}

impl EventQueryService {
    /// 新しいイベントクエリサービスを作成
    ///
    /// # Arguments
    /// * `event_repository` - イベントリポジトリ
    pub fn new(event_repository: Arc<dyn EventRepository>) -> Self {
        Self { event_repository }
    }

    /// イベントIDでイベントを取得
    ///
    /// # Returns
    /// * `Ok(Some(Event))` - イベントが見つかった
    /// * `Ok(None)` - イベントが見つからなかった
    pub async fn get_event_by_id(
        &self,
        event_id: EventId,
    ) -> Result<Option<Event>, ApplicationError> {
        self.event_repository
            .find_by_id(event_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// すべてのイベントを取得
    /// 開催日時の昇順で並べて返す
    pub async fn get_all_events(&self) -> Result<Vec<Event>, ApplicationError> {
        self.event_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定された主催者のイベントを取得
    /// 開催日時の昇順で並べて返す
    pub async fn get_events_by_organizer(
        &self,
        organizer_id: UserId,
    ) -> Result<Vec<Event>, ApplicationError> {
        self.event_repository
            .find_by_organizer(organizer_id)
            .await
            .map_err(ApplicationError::from)
    }
}
