//! HTTP server lifecycle: bind, spawn the axum server in a background
//! task, and return a handle with a shutdown channel.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::{CoreState, StartupError};

/// Handle to a running server.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl ApiServer {
    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish, surfacing serve errors.
    pub async fn join(&mut self) -> Result<(), StartupError> {
        match (&mut self.task).await {
            Ok(result) => result.map_err(StartupError::Serve),
            Err(join_err) => Err(StartupError::Serve(std::io::Error::other(join_err))),
        }
    }

    /// Serve until `signal` resolves, then shut down gracefully. Returns
    /// early if the server task stops on its own.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        let stopped = tokio::select! {
            () = signal => None,
            result = self.join() => Some(result),
        };

        match stopped {
            None => {
                self.shutdown();
                self.join().await
            }
            Some(Ok(())) => {
                tracing::error!("API server stopped without a shutdown signal");
                Err(StartupError::Serve(std::io::Error::other(
                    "server stopped unexpectedly",
                )))
            }
            Some(Err(e)) => Err(e),
        }
    }
}

/// Bind `addr` and serve the API until shutdown is requested.
///
/// Bind failures are returned immediately so the caller can exit
/// non-zero before reporting readiness.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, StartupError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    let addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr, source })?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await;
        if let Err(e) = &result {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
        result
    });

    tracing::info!(%addr, "API server listening");

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
