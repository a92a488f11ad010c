// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod inventory;
pub(crate) mod event;
mod booking;
mod user;

pub use value_objects::{
    EventId, BookingId, UserId,
    Money,
    TicketQuantity,
    BookingStatus,
    Role,
};

pub use inventory::TicketInventory;
pub use event::{Event, EventDetails};
pub use booking::Booking;
pub use user::{UserProfile, VerifiedIdentity};
