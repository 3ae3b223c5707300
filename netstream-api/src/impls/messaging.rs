//! Per-connection session loop
//!
//! Transport-agnostic: the WebSocket layer supplies a [`SignalStream`] for
//! inbound events, outbound events flow through the relay's transport.
//! `SessionHandler::run` owns the whole lifetime of a party: join, dispatch
//! every inbound event, leave.

use std::sync::Arc;
use std::time::Duration;

use netstream_core::{ClientEvent, Error, PartyId, Result, SignalingRelay};

/// Inbound half of a party connection
#[async_trait::async_trait]
pub trait SignalStream: Send {
    /// Receive the next client event
    ///
    /// Returns None when the connection is closed. Benign errors (malformed
    /// frames) are skipped by the caller; anything else ends the session.
    async fn recv(&mut self) -> Option<Result<ClientEvent>>;

    /// Check if connection is still alive
    fn is_alive(&self) -> bool;
}

/// Drives one party through the relay for as long as its connection lives
pub struct SessionHandler {
    party_id: PartyId,
    relay: Arc<SignalingRelay>,
    liveness_check: Duration,
}

impl SessionHandler {
    pub fn new(party_id: PartyId, relay: Arc<SignalingRelay>, liveness_check: Duration) -> Self {
        Self {
            party_id,
            relay,
            liveness_check,
        }
    }

    /// Run the message loop until the connection ends
    ///
    /// Fails only when the party could not join (`RoomFull`); in that case the
    /// party has already been sent the denial and nothing needs cleaning up.
    pub async fn run<S: SignalStream>(&self, stream: &mut S) -> Result<()> {
        let role = self.relay.connect(self.party_id.clone())?;
        tracing::info!(party_id = %self.party_id, role = %role, "Party joined");

        loop {
            tokio::select! {
                inbound = stream.recv() => {
                    match inbound {
                        Some(Ok(event)) => self.relay.dispatch(&self.party_id, event),
                        Some(Err(e)) if e.is_benign() => {
                            tracing::warn!(party_id = %self.party_id, error = %e, "Ignoring bad frame");
                        }
                        Some(Err(e)) => {
                            tracing::error!(party_id = %self.party_id, error = %e, "Error receiving message");
                            break;
                        }
                        None => {
                            tracing::info!(party_id = %self.party_id, "Client disconnected");
                            break;
                        }
                    }
                }

                () = tokio::time::sleep(self.liveness_check) => {
                    if !stream.is_alive() {
                        tracing::info!(party_id = %self.party_id, "Connection no longer alive");
                        break;
                    }
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    fn cleanup(&self) {
        match self.relay.disconnect(&self.party_id) {
            Some(departure) if departure.new_host.is_some() => {
                tracing::info!(
                    party_id = %self.party_id,
                    new_host = ?departure.new_host,
                    "Host left, peer promoted"
                );
            }
            Some(_) => tracing::info!(party_id = %self.party_id, "Party left"),
            None => {
                tracing::debug!(party_id = %self.party_id, "Party was not in the room");
            }
        }
    }
}

impl std::fmt::Debug for SessionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandler")
            .field("party_id", &self.party_id)
            .field("liveness_check", &self.liveness_check)
            .finish_non_exhaustive()
    }
}

/// Whether a session was refused because the room was full
#[must_use]
pub const fn is_room_full(result: &Result<()>) -> bool {
    matches!(result, Err(Error::RoomFull))
}
