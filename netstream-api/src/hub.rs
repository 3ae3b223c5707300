use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use netstream_core::{Error, PartyId, Result, ServerEvent, Transport};

/// Outbound frame queue of one connection
pub type FrameSender = mpsc::Sender<String>;

/// In-memory hub addressing live connections by party id
///
/// Each connection registers a bounded queue; its writer task drains the queue
/// onto the socket. Sends never wait: a full queue fails the send.
#[derive(Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<DashMap<PartyId, FrameSender>>,
}

impl ConnectionHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning the receiving end of its queue
    pub fn register(&self, party_id: PartyId, buffer: usize) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(buffer.max(1));

        if self.connections.insert(party_id.clone(), tx).is_some() {
            warn!(party_id = %party_id, "Replaced existing connection queue");
        }
        info!(party_id = %party_id, "Connection registered");

        rx
    }

    /// Drop a connection's queue; its writer drains what is left and stops
    pub fn unregister(&self, party_id: &PartyId) -> bool {
        if self.connections.remove(party_id).is_some() {
            info!(party_id = %party_id, "Connection unregistered");
            true
        } else {
            debug!(party_id = %party_id, "Attempted to unregister unknown connection");
            false
        }
    }

    #[must_use]
    pub fn is_connected(&self, party_id: &PartyId) -> bool {
        self.connections.contains_key(party_id)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Transport for ConnectionHub {
    fn send(&self, to: &PartyId, event: ServerEvent) -> Result<()> {
        let frame = event.to_json()?;

        let sender = self
            .connections
            .get(to)
            .ok_or_else(|| Error::Transport(format!("no connection for party {to}")))?;

        sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => {
                Error::Transport(format!("outbound queue full for party {to}"))
            }
            TrySendError::Closed(_) => {
                Error::Transport(format!("connection closed for party {to}"))
            }
        })?;

        debug!(party_id = %to, event = event.name(), "Queued event");
        Ok(())
    }
}
