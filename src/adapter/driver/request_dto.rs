use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::service::{EventChanges, ProfileChanges, UserChanges};
use crate::domain::error::DomainError;
use crate::domain::model::{EventDetails, Money, Role, TicketQuantity};

/// 予約作成用のリクエストDTO
/// 枚数は整数以外も受け取り、ドメインの値オブジェクトで検証する
#[derive(Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub event: Uuid,
    pub quantity: serde_json::Value,
}

impl CreateBookingRequest {
    pub fn quantity(&self) -> Result<TicketQuantity, DomainError> {
        TicketQuantity::from_json(&self.quantity)
    }
}

/// イベント登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub ticket_price: i64,
    pub total_tickets: u32,
}

impl CreateEventRequest {
    /// 説明情報、チケット単価、総チケット数に分解する
    pub fn into_parts(self) -> Result<(EventDetails, Money, u32), DomainError> {
        let ticket_price = Money::new(self.ticket_price)?;
        let details = EventDetails {
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            category: self.category,
            images: self.images,
        };
        Ok((details, ticket_price, self.total_tickets))
    }
}

/// イベント更新用のリクエストDTO
/// 総チケット数と残りチケット数は受け付けない
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub ticket_price: Option<i64>,
}

impl TryFrom<UpdateEventRequest> for EventChanges {
    type Error = DomainError;

    fn try_from(request: UpdateEventRequest) -> Result<Self, Self::Error> {
        Ok(EventChanges {
            title: request.title,
            description: request.description,
            date: request.date,
            location: request.location,
            category: request.category,
            images: request.images,
            ticket_price: request.ticket_price.map(Money::new).transpose()?,
        })
    }
}

/// プロフィール更新用のリクエストDTO
/// ロールとパスワードは受け付けない
#[derive(Serialize, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(request: UpdateProfileRequest) -> Self {
        ProfileChanges {
            name: request.name,
            email: request.email,
        }
    }
}

/// 管理者によるユーザー更新用のリクエストDTO
#[derive(Serialize, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = DomainError;

    fn try_from(request: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(UserChanges {
            name: request.name,
            email: request.email,
            role: request.role.as_deref().map(Role::from_string).transpose()?,
        })
    }
}
