pub mod api; // HTTP router + server lifecycle
pub mod checker; // Local symptom → condition matcher
pub mod config;
pub mod pipeline; // LLM diagnosis + streaming chat

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::pipeline::backend::BackendError;

/// Fatal errors during process startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Backend setup failed: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Run the HTTP server until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    let backend = pipeline::backend::from_config(&config.backend, config.request_timeout)?;
    // Not fatal: the backend may come up after the server does.
    if let Err(e) = backend.probe().await {
        tracing::warn!(
            backend = backend.name(),
            kind = e.kind(),
            error = %e,
            "Backend probe failed"
        );
    }
    let ctx = api::ApiContext::new(backend);
    let mut server = api::start_server(ctx, config.bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}
