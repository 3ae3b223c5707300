// Room status HTTP handler

use axum::{extract::State, Json};

use netstream_core::models::RoomSnapshot;

use super::AppState;

/// Current room state, host and members
///
/// Path: `GET /api/room`
pub async fn get_room(State(state): State<AppState>) -> Json<RoomSnapshot> {
    Json(state.relay.registry().snapshot())
}
