use crate::domain::model::{Booking, BookingId, Event, EventId, UserId, UserProfile};
use crate::domain::port::{BookingRepository, EventRepository, RepositoryError, UserDirectory};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct StoreState {
    events: HashMap<EventId, Event>,
    bookings: HashMap<BookingId, Booking>,
    users: HashMap<UserId, UserProfile>,
}

/// インメモリのチケットストア
/// イベント、予約、ユーザーを1つのロックで保護する
///
/// すべての書き込みはロックを保持したまま検証から反映まで行うため、
/// 予約と在庫の更新は常に原子的になる
#[derive(Default)]
pub struct InMemoryTicketingStore {
    state: Mutex<StoreState>,
}

impl InMemoryTicketingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ユーザープロフィールを登録する
    /// ユーザー管理は外部の担当のため、ローカル実行とテストで使用する
    pub async fn add_user(&self, profile: UserProfile) {
        let mut state = self.state.lock().await;
        state.users.insert(profile.id, profile);
    }
}

#[async_trait]
impl EventRepository for InMemoryTicketingStore {
    async fn insert(&self, event: &Event) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.events.contains_key(&event.id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "イベントは既に存在します: {}",
                event.id()
            )));
        }
        state.events.insert(event.id(), event.clone());
        Ok(())
    }

    async fn update_details(&self, event: &Event) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.events.get_mut(&event.id()) else {
            return Ok(false);
        };
        // 在庫は保存済みの値を維持する
        *stored = Event::reconstruct(
            stored.id(),
            stored.organizer_id(),
            event.details().clone(),
            event.ticket_price(),
            stored.inventory(),
            stored.created_at(),
            event.updated_at(),
        );
        Ok(true)
    }

    async fn find_by_id(&self, event_id: EventId) -> Result<Option<Event>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.events.get(&event_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Event>, RepositoryError> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state.events.values().cloned().collect();
        events.sort_by_key(|event| event.details().date);
        Ok(events)
    }

    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, RepositoryError> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|event| event.is_organized_by(organizer_id))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.details().date);
        Ok(events)
    }

    async fn delete_if_no_active_bookings(
        &self,
        event_id: EventId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.events.contains_key(&event_id) {
            return Ok(false);
        }
        let active = state
            .bookings
            .values()
            .filter(|booking| booking.event_id() == event_id && !booking.is_canceled())
            .count();
        if active > 0 {
            return Err(RepositoryError::Conflict(format!(
                "有効な予約が{}件あるため削除できません",
                active
            )));
        }
        state.events.remove(&event_id);
        Ok(true)
    }

    fn next_identity(&self) -> EventId {
        EventId::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryTicketingStore {
    async fn reserve(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.bookings.contains_key(&booking.id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "予約は既に存在します: {}",
                booking.id()
            )));
        }

        let event = state.events.get_mut(&booking.event_id()).ok_or_else(|| {
            RepositoryError::Conflict(format!("イベントが見つかりません: {}", booking.event_id()))
        })?;
        event
            .reserve_tickets(booking.quantity())
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        state.bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn cancel(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let StoreState {
            events, bookings, ..
        } = &mut *state;

        let stored = bookings.get_mut(&booking.id()).ok_or_else(|| {
            RepositoryError::Conflict(format!("予約が見つかりません: {}", booking.id()))
        })?;
        if stored.is_canceled() {
            return Err(RepositoryError::Conflict(format!(
                "予約は既にキャンセルされています: {}",
                booking.id()
            )));
        }

        let event = events.get_mut(&booking.event_id()).ok_or_else(|| {
            RepositoryError::Conflict(format!("イベントが見つかりません: {}", booking.event_id()))
        })?;
        // 在庫の更新が失敗した場合は予約も変更しない
        event
            .release_tickets(booking.quantity())
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        *stored = booking.clone();
        Ok(())
    }

    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.bookings.get(&booking_id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, RepositoryError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|booking| booking.is_owned_by(user_id))
            .cloned()
            .collect();
        bookings.sort_by_key(|booking| std::cmp::Reverse(booking.created_at()));
        Ok(bookings)
    }

    fn next_identity(&self) -> BookingId {
        BookingId::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryTicketingStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let state = self.state.lock().await;
        let mut users: Vec<UserProfile> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn update(&self, profile: &UserProfile) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&profile.id) {
            return Ok(false);
        }
        let email_taken = state.users.values().any(|other| {
            other.id != profile.id && other.email.eq_ignore_ascii_case(&profile.email)
        });
        if email_taken {
            return Err(RepositoryError::Conflict(format!(
                "メールアドレスは既に使用されています: {}",
                profile.email
            )));
        }
        state.users.insert(profile.id, profile.clone());
        Ok(true)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.users.remove(&user_id).is_some())
    }
}
