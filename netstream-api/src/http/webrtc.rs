//! WebRTC configuration endpoint
//!
//! Browsers fetch the STUN/TURN list before creating their peer connection.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use netstream_core::config::IceServerConfig;

use crate::http::AppState;

/// Response for ICE servers request
#[derive(Debug, Serialize, Deserialize)]
pub struct GetIceServersResponse {
    /// List of ICE servers (STUN and TURN)
    pub servers: Vec<IceServerConfig>,
}

/// Get ICE servers configuration for WebRTC
///
/// Path: `GET /api/webrtc/ice-servers`
///
/// # Response
/// ```json
/// {
///   "servers": [
///     { "urls": ["stun:stun.l.google.com:19302"] },
///     {
///       "urls": ["turn:openrelay.metered.ca:80"],
///       "username": "openrelayproject",
///       "credential": "openrelayproject"
///     }
///   ]
/// }
/// ```
pub async fn get_ice_servers(State(state): State<AppState>) -> Json<GetIceServersResponse> {
    Json(GetIceServersResponse {
        servers: state.config.webrtc.ice_servers.clone(),
    })
}
