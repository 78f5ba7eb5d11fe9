use std::net::SocketAddr;
use std::sync::Arc;

use medipoldao_backend::{config, db, router, store::PgStore, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = config::AppConfig::load()?;
    log::info!("Loaded config: {:?}", config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let pool = db::establish_pool(&config.database_url, config.db_pool_size)?;
    let state = AppState::new(config, Arc::new(PgStore::new(pool)));

    log::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state).into_make_service()).await?;

    Ok(())
}
