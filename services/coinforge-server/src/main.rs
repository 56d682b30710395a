//! Coinforge Server binary
//!
//! ```bash
//! cargo run -p coinforge-server
//! curl http://localhost:8080/api/v1/users
//! ```

use std::sync::Arc;

use coinforge_billing::{Billing, LedgerStore, MemoryLedger};
use coinforge_server::{config::ServerConfig, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load()?;
    tracing::info!("starting coinforge server");

    let store = Arc::new(MemoryLedger::new());
    for seed in &config.seed_users {
        store.add_user(&seed.name, seed.rating).await?;
    }
    tracing::info!(users = config.seed_users.len(), "roster seeded");

    let app = router(Billing::new(store));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
