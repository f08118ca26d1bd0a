use expense_tracker::api;
use expense_tracker::auth::{jwt::JwtService, password::PasswordHasher};
use expense_tracker::config::CONFIG;
use expense_tracker::infrastructure::storage::{self, StorageBackend};
use expense_tracker::ExpenseService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&CONFIG.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(config = ?*CONFIG, "starting expense tracker");
    if CONFIG.uses_dev_secret() {
        warn!("JWT_SECRET not set, using the development secret");
    }

    let backend = StorageBackend::from_url(&CONFIG.database_url)?;
    info!(backend = backend.name(), "connecting storage");
    let storage = storage::connect(&CONFIG.database_url).await?;

    let service = Arc::new(ExpenseService::new(
        storage,
        JwtService::new(&CONFIG.jwt_secret, CONFIG.token_ttl_secs),
        PasswordHasher::new(CONFIG.bcrypt_cost),
    ));

    let app = api::app(service, Duration::from_secs(CONFIG.request_timeout_secs));

    let addr: SocketAddr = format!("{}:{}", CONFIG.host, CONFIG.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
