//! Main entry point for the LST application.
//!
//! Builds the store pool and core configuration once, serves the REST API,
//! and shuts the pool down when the server stops. This is the deployable
//! launcher; `lst-api-rest` is the development-only standalone server.

use lst_core::{CoreConfig, StorePool, TrackerService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Starts the LST REST server.
///
/// # Environment Variables
/// - `LST_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RUST_LOG`: tracing filter, combined with a default of `lst=info`
///
/// # Errors
/// Returns an error if the tracing configuration cannot be initialised,
/// the address cannot be bound, the HTTP server fails while running, or
/// the store pool fails to shut down cleanly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("lst=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("LST_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    // Store pool lifecycle: one store per testing program, built here and
    // shut down exactly once after the server stops.
    let pool = Arc::new(StorePool::open_in_memory());
    let cfg = Arc::new(CoreConfig::default());
    let service = TrackerService::new(Arc::clone(&pool), cfg);

    let app = api_rest::router(service);

    tracing::info!("-- Starting LST REST API on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.shutdown()?;
    tracing::info!("store pool shut down, exiting");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
}
