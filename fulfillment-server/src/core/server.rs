//! Server Implementation
//!
//! HTTP server startup, background tasks and graceful shutdown.

use crate::core::{Config, ServerState};
use crate::events::spawn_resync;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with tests/tools)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        start_background_tasks(&state);

        let app = build_app(state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Fulfillment server starting on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let shutdown = state.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down...");
                    }
                }
            })
            .await?;

        state.shutdown.cancel();
        Ok(())
    }
}

/// Build the application router with middleware
pub fn build_app(state: ServerState) -> axum::Router {
    crate::api::router(state).layer(TraceLayer::new_for_http())
}

/// Spawn the in-process observer: an event subscription for low-latency
/// visibility plus the periodic resync that guarantees convergence even
/// when events are dropped.
fn start_background_tasks(state: &ServerState) {
    let mut subscription = state.manager.subscribe(|_| true);
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = subscription.recv() => match event {
                    Some(event) => tracing::debug!(event = %event, "Lifecycle event observed"),
                    None => break,
                },
            }
        }
    });

    let manager = state.manager.clone();
    spawn_resync(
        Duration::from_millis(state.config.resync_interval_ms),
        state.shutdown.clone(),
        move || {
            let manager = manager.clone();
            async move {
                match manager.list_active() {
                    Ok(active) => {
                        tracing::debug!(active_orders = active.len(), "Resync snapshot")
                    }
                    Err(e) => tracing::warn!(error = %e, "Resync refetch failed"),
                }
            }
        },
    );
}
