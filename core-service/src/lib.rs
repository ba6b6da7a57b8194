//! HTTP surface of the Box token broker.
//!
//! Wires the configuration, the native HTTP bridge and the credential provider
//! into an axum application serving the token, config, upload-callback and
//! metadata endpoints plus the static frontend.

pub mod api;
pub mod error;
pub mod state;

pub use api::router;
pub use error::{Result, ServiceError};
pub use state::AppState;

use std::sync::Arc;

use anyhow::Context;
use bridge_native::ReqwestHttpClient;
use bridge_traits::HttpClient;
use core_runtime::config::BrokerConfig;

/// Build the production HTTP client honouring the configured timeout.
pub fn native_http_client(config: &BrokerConfig) -> anyhow::Result<Arc<dyn HttpClient>> {
    let client = match config.http_timeout() {
        Some(timeout) => ReqwestHttpClient::with_timeout(timeout),
        None => ReqwestHttpClient::new(),
    }
    .context("failed to build HTTP client")?;

    Ok(Arc::new(client))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: BrokerConfig) -> anyhow::Result<()> {
    let http_client = native_http_client(&config)?;
    let address = config.server.bind_address();

    tracing::info!(
        address = %address,
        static_dir = %config.server.static_dir.display(),
        downscope_tokens = config.features.downscope_tokens,
        cache_tokens = config.features.cache_tokens,
        apply_upload_metadata = config.features.apply_upload_metadata,
        "Starting box-broker"
    );

    let app = router(AppState::new(config, http_client));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running server")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
