use crate::domain::error::DomainError;
use crate::domain::model::{BookingId, BookingStatus, Event, EventId, Money, TicketQuantity, UserId};
use chrono::{DateTime, Utc};

/// Booking集約
/// ユーザーによるチケット予約のライフサイクルを管理する
///
/// 状態遷移: Pending / Confirmed → Canceled（一度だけ）
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    id: BookingId,
    user_id: UserId,
    event_id: EventId,
    quantity: TicketQuantity,
    total_price: Money,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Booking {
    /// イベントに対する新しい予約を作成
    /// 合計金額は作成時点のチケット単価で計算し、以後再計算しない
    ///
    /// イベントの在庫は変更しない。在庫の減算はリポジトリが
    /// 予約の保存と同じトランザクションで行う
    ///
    /// # Returns
    /// * `Err(DomainError::InsufficientInventory)` - 残りチケット数が不足
    /// * `Err(DomainError::PriceOverflow)` - 合計金額がオーバーフロー
    pub fn reserve(
        id: BookingId,
        user_id: UserId,
        event: &Event,
        quantity: TicketQuantity,
    ) -> Result<Self, DomainError> {
        if !event.inventory().has_available(quantity) {
            return Err(DomainError::InsufficientInventory);
        }
        let total_price = event.price_for(quantity)?;
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            event_id: event.id(),
            quantity,
            total_price,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        })
    }

    /// データベースから取得したデータで予約を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: BookingId,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
        total_price: Money,
        status: BookingStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            event_id,
            quantity,
            total_price,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn quantity(&self) -> TicketQuantity {
        self.quantity
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 指定されたユーザーの予約かどうか
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// キャンセル済みかどうか
    pub fn is_canceled(&self) -> bool {
        self.status == BookingStatus::Canceled
    }

    /// 予約をキャンセル
    /// 事前条件: キャンセル済みでないこと
    ///
    /// # Returns
    /// * `Err(DomainError::AlreadyCanceled)` - 既にキャンセル済み
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.is_canceled() {
            return Err(DomainError::AlreadyCanceled);
        }
        self.status = BookingStatus::Canceled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::event::tests::sample_details;
    use crate::domain::model::TicketInventory;

    fn event_with(price: i64, total: u32, remaining: u32) -> Event {
        Event::reconstruct(
            EventId::new(),
            UserId::new(),
            sample_details(),
            Money::new(price).unwrap(),
            TicketInventory::reconstruct(total, remaining).unwrap(),
            Utc::now(),
            Utc::now(),
        )
    }

    fn qty(n: u32) -> TicketQuantity {
        TicketQuantity::new(n).unwrap()
    }

    #[test]
    fn test_reserve_computes_total_price() {
        let event = event_with(20, 10, 10);
        let user_id = UserId::new();
        let booking = Booking::reserve(BookingId::new(), user_id, &event, qty(6)).unwrap();

        assert_eq!(booking.total_price().amount(), 120);
        assert_eq!(booking.status(), BookingStatus::Confirmed);
        assert_eq!(booking.event_id(), event.id());
        assert!(booking.is_owned_by(user_id));
    }

    #[test]
    fn test_reserve_rejects_insufficient_inventory() {
        let event = event_with(20, 10, 3);
        let result = Booking::reserve(BookingId::new(), UserId::new(), &event, qty(4));
        assert_eq!(result, Err(DomainError::InsufficientInventory));
    }

    #[test]
    fn test_reserve_does_not_touch_event_inventory() {
        let event = event_with(20, 10, 10);
        Booking::reserve(BookingId::new(), UserId::new(), &event, qty(4)).unwrap();
        assert_eq!(event.remaining_tickets(), 10);
    }

    #[test]
    fn test_cancel_once() {
        let event = event_with(20, 10, 10);
        let mut booking =
            Booking::reserve(BookingId::new(), UserId::new(), &event, qty(3)).unwrap();

        booking.cancel().unwrap();
        assert!(booking.is_canceled());
        assert_eq!(booking.cancel(), Err(DomainError::AlreadyCanceled));
    }

    #[test]
    fn test_pending_booking_can_be_canceled() {
        let mut booking = Booking::reconstruct(
            BookingId::new(),
            UserId::new(),
            EventId::new(),
            qty(1),
            Money::new(20).unwrap(),
            BookingStatus::Pending,
            Utc::now(),
            Utc::now(),
        );
        assert!(booking.cancel().is_ok());
    }
}
