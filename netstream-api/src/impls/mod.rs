// Transport-agnostic connection handling shared by the HTTP layer

pub mod messaging;

pub use messaging::{is_room_full, SessionHandler, SignalStream};
