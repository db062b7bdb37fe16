//! Event ledger HTTP API server.
//!
//! # Usage
//!
//! ```bash
//! PETAL_PORT=3000 PETAL_INVENTORY_SEED=stock.json \
//!   cargo run --bin event-ledger --features http
//! ```
//!
//! `stock.json` maps product ids to starting quantities:
//!
//! ```json
//! { "rose-red": 120, "baby-breath": 40 }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /events` - Book an event
//! - `GET /events` - List events
//! - `GET /events/:id` - Get event details
//! - `PUT /events/:id` - Amend an event or record a payment
//! - `POST /events/:id/cancel` - Cancel an event
//! - `DELETE /events/:id` - Delete an event
//! - `GET /health` - Health check

use anyhow::Context;
use event_ledger::router::event_router;
use event_ledger::{
    Config, EventEnvironment, EventLedger, InMemoryEventRepository, InMemoryInventory,
};
use petal_core::environment::SystemClock;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("=== Petal Event Ledger ===");

    let inventory = match &config.inventory.seed_path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading inventory seed {}", path.display()))?;
            let inventory = InMemoryInventory::from_json(&json)
                .with_context(|| format!("parsing inventory seed {}", path.display()))?;
            info!(path = %path.display(), "Inventory seeded");
            inventory
        },
        None => {
            info!("PETAL_INVENTORY_SEED not set, starting with empty inventory");
            InMemoryInventory::new()
        },
    };

    let environment = EventEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(inventory),
        Arc::new(InMemoryEventRepository::new()),
    );
    let ledger = Arc::new(EventLedger::with_config(environment, config.store_config()));

    let app = event_router(ledger);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
