//! Read-only HTTP API over a catalogue of Trainz assets.
//!
//! Clients poll [`http::router`] for assets newer than a revision or a
//! timestamp and for aggregate statistics about the two storage tiers. The
//! catalogue lives in `trainz-store`, directory sizes come from
//! `trainz-inspect` and settings from `trainz-config`.

pub mod cache;
pub mod error;
pub mod http;
pub mod logging;
pub mod service;

use crate::error::{ErrorKind, Result};
use crate::service::AssetService;
use exn::ResultExt;
use std::sync::Arc;
use trainz_config::Config;
use trainz_store::{Database, Repository};

/// Serve the API until Ctrl-C.
///
/// Connects to (and migrates) the database, binds `config.bind` and closes
/// the pool once in-flight requests have drained.
pub async fn run(config: Config) -> Result<()> {
    let db = Database::connect(&config.db_url).await.or_raise(|| ErrorKind::Store)?;

    let store = Arc::new(Repository::from(&db));
    let service = AssetService::from_config(store, &config).into_shared();
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(config.bind).await.or_raise(|| ErrorKind::Server)?;
    tracing::info!(address = %config.bind, "listening");

    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    db.close().await;
    served.or_raise(|| ErrorKind::Server)?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
