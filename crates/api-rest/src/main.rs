//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own against fresh in-memory stores.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). The workspace's main `lst-run` binary is the
//! deployable launcher with the full startup/shutdown lifecycle.

use lst_core::{CoreConfig, StorePool, TrackerService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the standalone LST REST API server.
///
/// # Environment Variables
/// - `LST_REST_ADDR`: Server address (default: "0.0.0.0:3000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("LST_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting LST REST API on {}", addr);

    let pool = Arc::new(StorePool::open_in_memory());
    let cfg = Arc::new(CoreConfig::default());
    let service = TrackerService::new(Arc::clone(&pool), cfg);

    let app = api_rest::router(service);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    pool.shutdown()?;
    Ok(())
}
