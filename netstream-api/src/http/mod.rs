// Module: http
// WebSocket signaling endpoint plus a small JSON API

pub mod error;
pub mod health;
pub mod room;
pub mod webrtc;
pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use netstream_core::{Config, SessionRegistry, SignalingRelay};

use crate::hub::ConnectionHub;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<SignalingRelay>,
    pub hub: ConnectionHub,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a fresh registry and relay to a new connection hub
    #[must_use]
    pub fn new(config: Config) -> Self {
        let hub = ConnectionHub::new();
        let relay = Arc::new(SignalingRelay::new(
            Arc::new(SessionRegistry::new()),
            Arc::new(hub.clone()),
        ));

        Self {
            relay,
            hub,
            config: Arc::new(config),
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check endpoints (for monitoring probes)
        .merge(health::create_health_router())
        // Signaling
        .route("/ws", get(websocket::websocket_handler))
        .route("/api/room", get(room::get_room))
        .route("/api/webrtc/ice-servers", get(webrtc::get_ice_servers))
        .fallback(error::route_not_found);

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    router.with_state(state)
}
