// 駆動される側アダプター（リポジトリ実装など）

mod event_repository;
mod booking_repository;
mod user_directory;
mod in_memory_store;

pub use event_repository::MySqlEventRepository;
pub use booking_repository::MySqlBookingRepository;
pub use user_directory::MySqlUserDirectory;
pub use in_memory_store::InMemoryTicketingStore;
