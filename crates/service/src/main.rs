use std::net::SocketAddr;

use cantus_filter_core::ChoiceCatalog;
use cantus_filter_service::config::ServiceConfig;
use cantus_filter_service::create_router;
use cantus_filter_service::handlers::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();
    let config = ServiceConfig::load();
    let catalog = ChoiceCatalog::load(&config.static_dir);
    let state = AppState::new(catalog, &config);
    let app = create_router(state);
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
