// SPDX-License-Identifier: MIT

//! ChronoArcana API Server
//!
//! Serves daily tarot pulls: one card per user per local calendar day,
//! with journaling, history analytics, and CSV export on top.

use chronoarcana::{config::Config, db::SupabaseDb, services::DeckCatalog, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting ChronoArcana API");

    // Initialize the Supabase REST client
    let db = SupabaseDb::new(&config.supabase_url, &config.supabase_service_key)
        .expect("Failed to initialize store client");

    // Warm the deck catalog; a cold cache is fine, cards load lazily
    let catalog = DeckCatalog::default();
    match catalog.warm(&db).await {
        Ok((decks, cards)) => {
            tracing::info!(decks, cards, "Deck catalog loaded");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Deck catalog warmup failed; will load lazily");
        }
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        catalog,
    });

    // Daily retention sweep for free-tier history
    spawn_retention_sweep(state.db.clone());

    // Build router
    let app = chronoarcana::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically delete free-tier pulls that aged out of the retention
/// window. The store procedure owns the cutoff; this just triggers it.
fn spawn_retention_sweep(db: SupabaseDb) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            match db.prune_expired_pulls().await {
                Ok(()) => tracing::info!("Retention sweep completed"),
                Err(e) => tracing::warn!(error = %e, "Retention sweep failed"),
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chronoarcana=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
