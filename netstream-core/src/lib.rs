//! `NetStream` signaling core
//!
//! Brokers a two-party peer-to-peer media session:
//!
//! - **`SessionRegistry`**: the single room, its members, roles and host failover
//! - **`SignalingRelay`**: routes offers, answers, candidates and side channels
//!   between the two parties through a [`Transport`]
//!
//! Session descriptions and connectivity candidates are opaque JSON values and
//! are forwarded untouched.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod service;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{ClientEvent, ServerEvent};
pub use models::{PartyId, Role, RoomState};
pub use service::{SessionRegistry, SignalingRelay};
pub use transport::Transport;
