use crate::domain::error::DomainError;
use crate::domain::model::{EventId, Money, TicketInventory, TicketQuantity, UserId};
use chrono::{DateTime, Utc};

/// イベントの説明情報
/// チケット在庫とは独立して主催者が編集できる
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub images: Vec<String>,
}

impl EventDetails {
    /// 必須項目が空でないことを確認
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("category", &self.category),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidValue(format!(
                    "{}は必須です",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// イベント集約
/// チケット価格と在庫を保持する
///
/// 残りチケット数はこの集約のメソッド経由でのみ変化し、
/// 永続化は予約リポジトリの原子的な操作でのみ行う
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    organizer_id: UserId,
    details: EventDetails,
    ticket_price: Money,
    inventory: TicketInventory,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Event {
    /// 新しいイベントを作成
    ///
    /// # Arguments
    /// * `id` - イベントID
    /// * `organizer_id` - 主催者のユーザーID
    /// * `details` - 説明情報
    /// * `ticket_price` - チケット単価
    /// * `total_tickets` - 総チケット数（1以上）
    pub fn new(
        id: EventId,
        organizer_id: UserId,
        details: EventDetails,
        ticket_price: Money,
        total_tickets: u32,
    ) -> Result<Self, DomainError> {
        details.validate()?;
        let inventory = TicketInventory::new(total_tickets)?;
        let now = Utc::now();
        Ok(Self {
            id,
            organizer_id,
            details,
            ticket_price,
            inventory,
            created_at: now,
            updated_at: now,
        })
    }

    /// データベースから取得したデータでイベントを再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        id: EventId,
        organizer_id: UserId,
        details: EventDetails,
        ticket_price: Money,
        inventory: TicketInventory,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organizer_id,
            details,
            ticket_price,
            inventory,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn organizer_id(&self) -> UserId {
        self.organizer_id
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn ticket_price(&self) -> Money {
        self.ticket_price
    }

    pub fn inventory(&self) -> TicketInventory {
        self.inventory
    }

    pub fn total_tickets(&self) -> u32 {
        self.inventory.total()
    }

    pub fn remaining_tickets(&self) -> u32 {
        self.inventory.remaining()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 指定されたユーザーが主催者かどうか
    pub fn is_organized_by(&self, user_id: UserId) -> bool {
        self.organizer_id == user_id
    }

    /// 指定枚数の合計金額を計算
    pub fn price_for(&self, quantity: TicketQuantity) -> Result<Money, DomainError> {
        self.ticket_price.multiply(quantity.value())
    }

    /// チケットを予約し、残りチケット数を減らす
    pub fn reserve_tickets(&mut self, quantity: TicketQuantity) -> Result<(), DomainError> {
        self.inventory.reserve(quantity)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// チケットを解放し、残りチケット数を戻す
    pub fn release_tickets(&mut self, quantity: TicketQuantity) -> Result<(), DomainError> {
        self.inventory.release(quantity)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 説明情報を更新
    pub fn update_details(&mut self, details: EventDetails) -> Result<(), DomainError> {
        details.validate()?;
        self.details = details;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// チケット単価を変更
    /// 既存の予約の合計金額は再計算しない
    pub fn change_ticket_price(&mut self, ticket_price: Money) {
        self.ticket_price = ticket_price;
        self.updated_at = Utc::now();
    }
}
