pub mod registry;
pub mod relay;

pub use registry::{Assignment, Departure, SessionRegistry, ROOM_CAPACITY};
pub use relay::SignalingRelay;
