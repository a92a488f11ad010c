use crate::application::ApplicationError;
use crate::domain::model::{Booking, BookingId, Event, UserId, UserProfile, VerifiedIdentity};
use crate::domain::port::{BookingRepository, EventRepository, UserDirectory};
use std::collections::HashMap;
use std::sync::Arc;

/// 関連するイベントとユーザーを解決済みの予約
/// イベントやユーザーが既に存在しない場合は `None`
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub booking: Booking,
    pub event: Option<Event>,
    pub user: Option<UserProfile>,
}

/// 予約クエリサービス
/// 読み取り専用の予約操作を提供する
pub struct BookingQueryService {
    booking_repository: Arc<dyn BookingRepository>,
    event_repository: Arc<dyn EventRepository>,
    user_directory: Arc<dyn UserDirectory>,
}

impl BookingQueryService {
    /// 新しい予約クエリサービスを作成
    ///
    /// # Arguments
    /// * `booking_repository` - 予約リポジトリ
    /// * `event_repository` - イベントリポジトリ
    /// * `user_directory` - ユーザーディレクトリ
    pub fn new(
        booking_repository: Arc<dyn BookingRepository>,
        event_repository: Arc<dyn EventRepository>,
        user_directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            booking_repository,
            event_repository,
            user_directory,
        }
    }

    /// 予約IDで予約を取得し、イベントとユーザーを解決する
    /// 予約の所有者のみ取得できる
    ///
    /// # Returns
    /// * `Err(ApplicationError::NotFound)` - 予約が存在しない
    /// * `Err(ApplicationError::Forbidden)` - 他のユーザーの予約
    pub async fn get_booking(
        &self,
        booking_id: BookingId,
        identity: &VerifiedIdentity,
    ) -> Result<BookingDetails, ApplicationError> {
        let booking = self
            .booking_repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("予約が見つかりません: {}", booking_id))
            })?;

        if !booking.is_owned_by(identity.user_id()) {
            return Err(ApplicationError::Forbidden(
                "他のユーザーの予約は参照できません".to_string(),
            ));
        }

        let event = self.event_repository.find_by_id(booking.event_id()).await?;
        let user = self.user_directory.find_by_id(booking.user_id()).await?;

        Ok(BookingDetails {
            booking,
            event,
            user,
        })
    }

    /// 指定されたユーザーのすべての予約を取得
    /// 作成日時の降順で並べて返す
    pub async fn list_bookings_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BookingDetails>, ApplicationError> {
        let bookings = self.booking_repository.find_by_user(user_id).await?;
        if bookings.is_empty() {
            return Ok(Vec::new());
        }

        let user = self.user_directory.find_by_id(user_id).await?;

        // 同じイベントは一度だけ取得する
        let mut events: HashMap<_, Option<Event>> = HashMap::new();
        for booking in &bookings {
            if !events.contains_key(&booking.event_id()) {
                let event = self.event_repository.find_by_id(booking.event_id()).await?;
                events.insert(booking.event_id(), event);
            }
        }

        Ok(bookings
            .into_iter()
            .map(|booking| BookingDetails {
                event: events.get(&booking.event_id()).cloned().flatten(),
                user: user.clone(),
                booking,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryTicketingStore;
    use crate::application::service::{BookingApplicationService, EventApplicationService};
    use crate::domain::model::{EventDetails, Money, Role, TicketQuantity};
    use chrono::Utc;

    fn details(title: &str) -> EventDetails {
        EventDetails {
            title: title.to_string(),
            description: "desc".to_string(),
            date: Utc::now(),
            location: "Nagoya".to_string(),
            category: "Sports".to_string(),
            images: vec![],
        }
    }

    struct Fixture {
        store: Arc<InMemoryTicketingStore>,
        events: EventApplicationService,
        bookings: BookingApplicationService,
        queries: BookingQueryService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTicketingStore::new());
        Fixture {
            events: EventApplicationService::new(store.clone()),
            bookings: BookingApplicationService::new(store.clone(), store.clone()),
            queries: BookingQueryService::new(store.clone(), store.clone(), store.clone()),
            store,
        }
    }

    #[tokio::test]
    async fn test_get_booking_resolves_event_and_user() {
        let f = fixture();
        let identity = VerifiedIdentity::new(UserId::new(), Role::User);
        f.store
            .add_user(UserProfile {
                id: identity.user_id(),
                name: "Hanako".to_string(),
                email: "hanako@example.com".to_string(),
                role: Role::User,
            })
            .await;
        let organizer = VerifiedIdentity::new(UserId::new(), Role::Organizer);
        let event = f
            .events
            .create_event(details("Final"), Money::new(50).unwrap(), 5, &organizer)
            .await
            .unwrap();
        let booking = f
            .bookings
            .reserve(event.id(), TicketQuantity::new(2).unwrap(), &identity)
            .await
            .unwrap();

        let found = f.queries.get_booking(booking.id(), &identity).await.unwrap();

        assert_eq!(found.booking.id(), booking.id());
        assert_eq!(found.event.unwrap().id(), event.id());
        assert_eq!(found.user.unwrap().name, "Hanako");
    }

    #[tokio::test]
    async fn test_get_booking_of_other_user_is_forbidden() {
        let f = fixture();
        let owner = VerifiedIdentity::new(UserId::new(), Role::User);
        let organizer = VerifiedIdentity::new(UserId::new(), Role::Organizer);
        let event = f
            .events
            .create_event(details("Final"), Money::new(50).unwrap(), 5, &organizer)
            .await
            .unwrap();
        let booking = f
            .bookings
            .reserve(event.id(), TicketQuantity::new(1).unwrap(), &owner)
            .await
            .unwrap();

        let stranger = VerifiedIdentity::new(UserId::new(), Role::User);
        let result = f.queries.get_booking(booking.id(), &stranger).await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_booking_not_found() {
        let f = fixture();
        let identity = VerifiedIdentity::new(UserId::new(), Role::User);
        let result = f.queries.get_booking(BookingId::new(), &identity).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_bookings_for_user() {
        let f = fixture();
        let identity = VerifiedIdentity::new(UserId::new(), Role::User);
        let other = VerifiedIdentity::new(UserId::new(), Role::User);
        let organizer = VerifiedIdentity::new(UserId::new(), Role::Organizer);
        let first = f
            .events
            .create_event(details("Semi Final"), Money::new(10).unwrap(), 5, &organizer)
            .await
            .unwrap();
        let second = f
            .events
            .create_event(details("Final"), Money::new(50).unwrap(), 5, &organizer)
            .await
            .unwrap();
        let one = TicketQuantity::new(1).unwrap();
        f.bookings.reserve(first.id(), one, &identity).await.unwrap();
        f.bookings.reserve(second.id(), one, &identity).await.unwrap();
        f.bookings.reserve(second.id(), one, &other).await.unwrap();

        let bookings = f
            .queries
            .list_bookings_for_user(identity.user_id())
            .await
            .unwrap();

        assert_eq!(bookings.len(), 2);
        assert!(bookings
            .iter()
            .all(|details| details.booking.is_owned_by(identity.user_id())));
        assert!(bookings.iter().all(|details| details.event.is_some()));
    }

    #[tokio::test]
    async fn test_list_bookings_for_user_without_bookings() {
        let f = fixture();
        let bookings = f.queries.list_bookings_for_user(UserId::new()).await.unwrap();
        assert!(bookings.is_empty());
    }
}
