use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// イベントの一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// 新しい一意のEventIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから EventId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からEventIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// 予約の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// 新しい一意のBookingIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから BookingId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からBookingIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// ユーザーの一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// 新しい一意のUserIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから UserId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からUserIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 金額を表す値オブジェクト
/// 最小通貨単位の整数で保持し、負の値は許可しない
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// 金額を作成
    /// 負の金額はエラー
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::InvalidValue(format!(
                "チケット価格は0以上である必要があります: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// 金額を乗算
    /// オーバーフローした場合はエラー
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Money)
            .ok_or(DomainError::PriceOverflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約するチケット枚数
/// 常に1以上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQuantity(u32);

impl TicketQuantity {
    /// 枚数を作成
    /// 0はエラー
    pub fn new(quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self(quantity))
    }

    /// 任意の整数から枚数を作成
    /// 0以下、またはu32に収まらない値はエラー
    pub fn from_i64(quantity: i64) -> Result<Self, DomainError> {
        let quantity = u32::try_from(quantity).map_err(|_| DomainError::InvalidQuantity)?;
        Self::new(quantity)
    }

    /// JSON値から枚数を作成
    /// 整数以外（小数、文字列、null）はエラー
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DomainError> {
        let quantity = value.as_i64().ok_or(DomainError::InvalidQuantity)?;
        Self::from_i64(quantity)
    }

    /// 枚数を取得
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TicketQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// 保留中（保存済みデータの読み込み時のみ）
    Pending,
    /// 確定
    Confirmed,
    /// キャンセル済み
    Canceled,
}

impl BookingStatus {
    /// 文字列からBookingStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "canceled" => Ok(BookingStatus::Canceled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }

    /// 永続化用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ユーザーのロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 一般ユーザー（チケット予約が可能）
    #[serde(alias = "Standard User")]
    User,
    /// イベント主催者
    #[serde(alias = "Organizer")]
    Organizer,
    /// システム管理者
    #[serde(alias = "System Admin")]
    Admin,
}

impl Role {
    /// 文字列からRoleを作成
    /// 旧来の表示名も受け付ける
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "user" | "Standard User" => Ok(Role::User),
            "organizer" | "Organizer" => Ok(Role::Organizer),
            "admin" | "System Admin" => Ok(Role::Admin),
            _ => Err(DomainError::InvalidValue(format!("無効なロール: {}", s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_rejects_negative_amount() {
        assert!(Money::new(-1).is_err());
        assert_eq!(Money::new(0).unwrap().amount(), 0);
    }

    #[test]
    fn test_money_multiply() {
        let price = Money::new(20).unwrap();
        assert_eq!(price.multiply(6).unwrap().amount(), 120);
    }

    #[test]
    fn test_money_multiply_overflow() {
        let price = Money::new(i64::MAX).unwrap();
        assert_eq!(price.multiply(2), Err(DomainError::PriceOverflow));
    }

    #[test]
    fn test_ticket_quantity_rejects_zero() {
        assert_eq!(TicketQuantity::new(0), Err(DomainError::InvalidQuantity));
        assert_eq!(TicketQuantity::new(3).unwrap().value(), 3);
    }

    #[test]
    fn test_ticket_quantity_from_i64() {
        assert!(TicketQuantity::from_i64(-1).is_err());
        assert!(TicketQuantity::from_i64(0).is_err());
        assert!(TicketQuantity::from_i64(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(TicketQuantity::from_i64(5).unwrap().value(), 5);
    }

    #[test]
    fn test_ticket_quantity_from_json() {
        assert_eq!(TicketQuantity::from_json(&json!(2)).unwrap().value(), 2);
        assert!(TicketQuantity::from_json(&json!(2.5)).is_err());
        assert!(TicketQuantity::from_json(&json!("3")).is_err());
        assert!(TicketQuantity::from_json(&json!(null)).is_err());
        assert!(TicketQuantity::from_json(&json!(0)).is_err());
        assert!(TicketQuantity::from_json(&json!(-4)).is_err());
    }

    #[test]
    fn test_booking_status_from_string() {
        assert_eq!(
            BookingStatus::from_string("canceled").unwrap(),
            BookingStatus::Canceled
        );
        assert!(BookingStatus::from_string("Canceled").is_err());
        assert!(BookingStatus::from_string("").is_err());
    }

    #[test]
    fn test_role_accepts_legacy_labels() {
        assert_eq!(Role::from_string("Standard User").unwrap(), Role::User);
        assert_eq!(Role::from_string("organizer").unwrap(), Role::Organizer);
        assert_eq!(Role::from_string("System Admin").unwrap(), Role::Admin);
        assert!(Role::from_string("root").is_err());
    }

    #[test]
    fn test_role_deserialize_alias() {
        let role: Role = serde_json::from_str("\"Standard User\"").unwrap();
        assert_eq!(role, Role::User);
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
