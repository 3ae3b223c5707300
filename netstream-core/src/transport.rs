//! Outbound side of the transport boundary
//!
//! The relay never talks to sockets directly. It addresses parties by
//! [`PartyId`] through this trait, which the HTTP layer implements over its
//! WebSocket connections and tests implement in memory.

use crate::error::Result;
use crate::events::ServerEvent;
use crate::models::PartyId;

/// Unicast and room broadcast delivery of server events
///
/// Implementations must not block: the relay calls them while holding its
/// dispatch lock.
pub trait Transport: Send + Sync {
    /// Send an event to a single party
    fn send(&self, to: &PartyId, event: ServerEvent) -> Result<()>;

    /// Send an event to every listed party, returning how many accepted it
    fn broadcast(&self, to: &[PartyId], event: &ServerEvent) -> usize {
        to.iter()
            .filter(|party_id| match self.send(party_id, event.clone()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        party_id = %party_id,
                        event = event.name(),
                        error = %e,
                        "Broadcast delivery failed"
                    );
                    false
                }
            })
            .count()
    }
}
