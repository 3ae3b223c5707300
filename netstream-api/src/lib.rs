// NetStream API Library
//
// HTTP and WebSocket surface for the NetStream signaling relay

pub mod http;
pub mod hub;
pub mod impls;

// Re-export commonly used types
pub use http::{create_router, AppState};
pub use hub::ConnectionHub;
