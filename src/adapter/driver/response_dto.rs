use crate::application::service::BookingDetails;
use crate::domain::model::{Booking, Event, UserProfile};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// イベント用のレスポンスDTO
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub organizer: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub images: Vec<String>,
    pub ticket_price: i64,
    pub total_tickets: u32,
    pub remaining_tickets: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 予約用のレスポンスDTO
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user: String,
    pub event: String,
    pub quantity: u32,
    pub total_price: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 予約詳細用のレスポンスDTO
/// イベントとユーザーが解決できない場合はnullになる
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailResponse {
    pub id: String,
    pub quantity: u32,
    pub total_price: i64,
    pub status: String,
    pub event: Option<EventResponse>,
    pub user: Option<UserProfileResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ユーザープロフィール用のレスポンスDTO
#[derive(Serialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// メッセージ付きのイベントレスポンス
#[derive(Serialize)]
pub struct EventMessageResponse {
    pub message: String,
    pub event: EventResponse,
}

/// メッセージ付きの予約レスポンス
#[derive(Serialize)]
pub struct BookingMessageResponse {
    pub message: String,
    pub booking: BookingResponse,
}

/// メッセージのみのレスポンス
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl EventResponse {
    /// ドメインオブジェクトからEventResponseを作成
    pub fn from_event(event: &Event) -> Self {
        let details = event.details();
        Self {
            id: event.id().to_string(),
            organizer: event.organizer_id().to_string(),
            title: details.title.clone(),
            description: details.description.clone(),
            date: details.date,
            location: details.location.clone(),
            category: details.category.clone(),
            images: details.images.clone(),
            ticket_price: event.ticket_price().amount(),
            total_tickets: event.total_tickets(),
            remaining_tickets: event.remaining_tickets(),
            created_at: event.created_at(),
            updated_at: event.updated_at(),
        }
    }
}

impl BookingResponse {
    /// ドメインオブジェクトからBookingResponseを作成
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id().to_string(),
            user: booking.user_id().to_string(),
            event: booking.event_id().to_string(),
            quantity: booking.quantity().value(),
            total_price: booking.total_price().amount(),
            status: booking.status().to_string(),
            created_at: booking.created_at(),
            updated_at: booking.updated_at(),
        }
    }
}

impl BookingDetailResponse {
    pub fn from_details(details: &BookingDetails) -> Self {
        let booking = &details.booking;
        Self {
            id: booking.id().to_string(),
            quantity: booking.quantity().value(),
            total_price: booking.total_price().amount(),
            status: booking.status().to_string(),
            event: details.event.as_ref().map(EventResponse::from_event),
            user: details.user.as_ref().map(UserProfileResponse::from_profile),
            created_at: booking.created_at(),
            updated_at: booking.updated_at(),
        }
    }
}

impl UserProfileResponse {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            role: profile.role.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        BookingId, EventDetails, EventId, Money, Role, TicketQuantity, UserId,
    };

    fn sample_event() -> Event {
        let details = EventDetails {
            title: "Rust Conf".to_string(),
            description: "Talks".to_string(),
            date: Utc::now(),
            location: "Tokyo".to_string(),
            category: "tech".to_string(),
            images: vec!["https://example.com/a.png".to_string()],
        };
        Event::new(EventId::new(), UserId::new(), details, Money::new(20).unwrap(), 10).unwrap()
    }

    #[test]
    fn test_event_response_from_event() {
        let event = sample_event();

        let response = EventResponse::from_event(&event);

        assert_eq!(response.id, event.id().to_string());
        assert_eq!(response.ticket_price, 20);
        assert_eq!(response.total_tickets, 10);
        assert_eq!(response.remaining_tickets, 10);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["remainingTickets"], 10);
        assert_eq!(json["ticketPrice"], 20);
    }

    #[test]
    fn test_booking_response_from_booking() {
        let event = sample_event();
        let booking = Booking::reserve(
            BookingId::new(),
            UserId::new(),
            &event,
            TicketQuantity::new(6).unwrap(),
        )
        .unwrap();

        let response = BookingResponse::from_booking(&booking);

        assert_eq!(response.quantity, 6);
        assert_eq!(response.total_price, 120);
        assert_eq!(response.status, "confirmed");
        assert_eq!(response.event, event.id().to_string());
    }

    #[test]
    fn test_booking_detail_response_with_missing_event() {
        let event = sample_event();
        let user_id = UserId::new();
        let booking = Booking::reserve(
            BookingId::new(),
            user_id,
            &event,
            TicketQuantity::new(1).unwrap(),
        )
        .unwrap();
        let details = BookingDetails {
            booking,
            event: None,
            user: Some(UserProfile {
                id: user_id,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                role: Role::User,
            }),
        };

        let json = serde_json::to_value(BookingDetailResponse::from_details(&details)).unwrap();

        assert!(json["event"].is_null());
        assert_eq!(json["user"]["role"], "user");
        assert_eq!(json["totalPrice"], 20);
    }
}
