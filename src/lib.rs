pub mod api;
pub mod artifacts;
pub mod config;
pub mod core_state;
pub mod pipeline;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::core_state::{CoreState, StartupError};

/// Start the service and block until Ctrl-C or SIGTERM.
///
/// Every artifact and the alias table are loaded before the socket is
/// bound. Any failure is returned so the binary can exit non-zero.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        addr = %config.bind_addr(),
        model_dir = %config.model_dir.display(),
        strict_aliases = config.strict_aliases,
        "Configuration resolved"
    );

    let core = Arc::new(CoreState::load(&config)?);
    let server = api::start_api_server(core, config.bind_addr()).await?;
    server.run_until(shutdown_signal()).await
}

/// Resolve on Ctrl-C or SIGTERM. A handler that can't be installed never
/// resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::warn!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
