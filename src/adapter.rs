pub mod database_config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;
pub mod server_config;

pub use database_config::{ConfigError, DatabaseConfig};
pub use database_migration::DatabaseMigration;
pub use server_config::{ServerConfig, StorageBackend};
