use event_ticketing::adapter::driven::{
    InMemoryTicketingStore, MySqlBookingRepository, MySqlEventRepository, MySqlUserDirectory,
};
use event_ticketing::adapter::driver::auth::JwtVerifier;
use event_ticketing::adapter::driver::rest_api::{create_router, AppState};
use event_ticketing::adapter::{DatabaseConfig, DatabaseMigration, ServerConfig, StorageBackend};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_ticketing=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== イベントチケット予約システム REST API ===");

    let server_config = ServerConfig::from_env()?;
    let jwt_verifier = JwtVerifier::new(&server_config.jwt_secret);

    let app_state = match server_config.storage_backend {
        StorageBackend::MySql => {
            // データベース設定を読み込む
            let config = DatabaseConfig::from_env()?;
            if config.url.is_some() {
                info!("DATABASE_URL からデータベース設定を読み込みました");
            } else {
                info!(host = %config.host, port = config.port, "データベース設定を読み込みました");
            }

            // 接続プールを作成
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.connection_string())
                .await?;
            info!("データベース接続プールを作成しました");

            // マイグレーションを実行
            DatabaseMigration::new(pool.clone()).run().await?;

            AppState::new(
                Arc::new(MySqlEventRepository::new(pool.clone())),
                Arc::new(MySqlBookingRepository::new(pool.clone())),
                Arc::new(MySqlUserDirectory::new(pool)),
                jwt_verifier,
            )
        }
        StorageBackend::InMemory => {
            warn!("インメモリストアを使用します。再起動するとデータは失われます");
            let store = Arc::new(InMemoryTicketingStore::new());
            AppState::new(store.clone(), store.clone(), store, jwt_verifier)
        }
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    // サーバーを起動
    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "REST APIサーバーが起動しました");
    info!("ヘルスチェック: GET /health");

    axum::serve(listener, app).await?;

    Ok(())
}
