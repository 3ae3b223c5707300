use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use netstream_api::{create_router, AppState, ConnectionHub};
use netstream_core::Config;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// `NetStream` server - owns the signaling state and the HTTP listener
pub struct NetStreamServer {
    config: Config,
    state: AppState,
}

impl NetStreamServer {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let state = AppState::new(config.clone());
        Self { config, state }
    }

    /// Start serving and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        info!("Starting NetStream server...");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let http_handle = self.start_http_server(shutdown_rx).await?;

        tokio::select! {
            _ = http_handle => {
                error!("HTTP server stopped unexpectedly");
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        // Stop accepting new connections
        if shutdown_tx.send(true).is_err() {
            warn!("HTTP server already gone");
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&self) {
        info!("Shutting down NetStream server...");

        let drain_timeout = Duration::from_secs(self.config.server.drain_timeout_seconds);
        drain_connections(&self.state.hub, drain_timeout).await;

        let room = self.state.relay.registry().snapshot();
        info!(
            members = room.members.len(),
            "NetStream server stopped"
        );
    }

    /// Bind the listener and serve with graceful shutdown support
    async fn start_http_server(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let http_address = self.config.http_address();
        let http_addr: SocketAddr = http_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid HTTP address '{http_address}': {e}"))?;

        let listener = TcpListener::bind(http_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_addr}: {e}"))?;
        info!("HTTP server listening on {}", http_addr);

        let http_router = create_router(self.state.clone());

        let handle = tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                // Sender dropped also means shut down
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, http_router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }
}

/// Wait for open connections to close, up to `timeout`
///
/// Returns true if every connection closed in time.
async fn drain_connections(hub: &ConnectionHub, timeout: Duration) -> bool {
    let active = hub.connection_count();
    if active == 0 {
        return true;
    }

    info!(
        "Waiting up to {}s for {} active connection(s) to drain...",
        timeout.as_secs(),
        active
    );
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = hub.connection_count();
        if remaining == 0 {
            info!("All connections drained");
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(
                "Drain timeout reached with {} connection(s) still active, proceeding with shutdown",
                remaining
            );
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL.min(timeout)).await;
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
