use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use lifeline_backend::storage::DbConnection;
use lifeline_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Setting up database");
    let db = match std::env::var("LIFELINE_DB") {
        Ok(url) => DbConnection::new(&url).await?,
        Err(_) => DbConnection::init().await?,
    };

    let app_state = initialize_backend(db)?;
    let app = create_router(app_state);

    let addr: SocketAddr = std::env::var("LIFELINE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
