//! Signaling relay
//!
//! Turns inbound party events into outbound events for the right recipient,
//! using the session registry to decide who that is. Offers go from host to
//! client, answers from client to host, candidates whichever way is open, and
//! the chat/transcription side channels go to the whole room.
//!
//! Every entry point runs under one dispatch lock, so a handler always sees
//! the registry as the previous handler left it and its outbound events are
//! queued before the next handler starts.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::events::{ClientEvent, ServerEvent};
use crate::models::{PartyId, Role};
use crate::service::registry::{Departure, SessionRegistry};
use crate::transport::Transport;

pub struct SignalingRelay {
    registry: Arc<SessionRegistry>,
    transport: Arc<dyn Transport>,
    dispatch_lock: Mutex<()>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<SessionRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            dispatch_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Admit a freshly connected party and announce it
    ///
    /// On `RoomFull` the party is told so before the error is returned; the
    /// caller is expected to close the connection.
    pub fn connect(&self, id: PartyId) -> Result<Role> {
        let _guard = self.dispatch_lock.lock();

        match self.registry.join(id.clone()) {
            Ok(assignment) => {
                self.deliver(&id, ServerEvent::role_assigned(assignment.role));
                if !assignment.role.is_host() {
                    self.deliver(
                        &assignment.host_id,
                        ServerEvent::UserConnected {
                            user_id: id.clone(),
                        },
                    );
                }
                Ok(assignment.role)
            }
            Err(Error::RoomFull) => {
                self.deliver(&id, ServerEvent::room_full());
                Err(Error::RoomFull)
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a closed connection, promoting the peer if the host left
    pub fn disconnect(&self, id: &PartyId) -> Option<Departure> {
        let _guard = self.dispatch_lock.lock();

        let Some(departure) = self.registry.leave(id) else {
            debug!(party_id = %id, "Disconnect from unknown party ignored");
            return None;
        };

        if let Some(new_host) = &departure.new_host {
            self.deliver(new_host, ServerEvent::role_assigned(Role::Host));
            self.deliver(new_host, ServerEvent::HostChanged { new_host: true });
        }

        if !departure.remaining.is_empty() {
            self.transport.broadcast(
                &departure.remaining,
                &ServerEvent::UserDisconnected {
                    user_id: id.clone(),
                },
            );
        }

        Some(departure)
    }

    /// Single entry point for events sent by a connected party
    pub fn dispatch(&self, from: &PartyId, event: ClientEvent) {
        let _guard = self.dispatch_lock.lock();

        let name = event.name();
        if let Err(e) = self.route(from, event) {
            match e {
                Error::UnknownParty(_) => {
                    debug!(party_id = %from, event = name, "Event from untracked party ignored");
                }
                e if e.is_benign() => {
                    warn!(party_id = %from, event = name, reason = %e, "Dropped event");
                }
                e => {
                    error!(party_id = %from, event = name, error = %e, "Failed to relay event");
                }
            }
        }
    }

    fn route(&self, from: &PartyId, event: ClientEvent) -> Result<()> {
        let role = self
            .registry
            .role_of(from)
            .ok_or_else(|| Error::UnknownParty(from.clone()))?;

        match event {
            ClientEvent::ReadyForConnection => self.handle_ready(from, role),
            ClientEvent::Offer { offer } => self.handle_offer(from, role, offer),
            ClientEvent::Answer { answer } => self.handle_answer(answer),
            ClientEvent::Candidate { candidate } => self.handle_candidate(from, role, candidate),
            ClientEvent::ConnectionFailed { reason } => {
                self.handle_connection_failed(from, reason.as_deref())
            }
            ClientEvent::ChatMessage(text) => self.handle_chat(role, &text),
            ClientEvent::Transcription { text } => self.handle_transcription(from, text),
            ClientEvent::Heartbeat => self.handle_heartbeat(from),
        }
    }

    fn handle_ready(&self, from: &PartyId, role: Role) -> Result<()> {
        info!(party_id = %from, role = %role, "Party ready for connection");

        if !role.is_host() {
            return Ok(());
        }
        match self.registry.peer(from) {
            Some(peer) => self.send(
                &peer,
                ServerEvent::InitiateConnection {
                    host_id: from.clone(),
                },
            ),
            None => {
                debug!(party_id = %from, "Host ready with no peer yet");
                Ok(())
            }
        }
    }

    fn handle_offer(&self, from: &PartyId, role: Role, offer: Value) -> Result<()> {
        if !role.is_host() {
            return Err(Error::NoEligibleRecipient("offer from non-host"));
        }
        let peer = self
            .registry
            .peer(from)
            .ok_or(Error::NoEligibleRecipient("offer"))?;

        info!(to = %peer, "Forwarding offer from host");
        self.send(&peer, ServerEvent::Offer { offer })
    }

    fn handle_answer(&self, answer: Value) -> Result<()> {
        let host = self
            .registry
            .host_id()
            .ok_or(Error::NoEligibleRecipient("answer"))?;

        info!(to = %host, "Forwarding answer to host");
        self.send(&host, ServerEvent::Answer { answer })
    }

    fn handle_candidate(&self, from: &PartyId, role: Role, candidate: Value) -> Result<()> {
        let target = if role.is_host() {
            self.registry.peer(from)
        } else {
            self.registry.host_id()
        }
        .ok_or(Error::NoEligibleRecipient("candidate"))?;

        debug!(from = %from, to = %target, "Forwarding candidate");
        self.send(&target, ServerEvent::Candidate { candidate })
    }

    fn handle_connection_failed(&self, from: &PartyId, reason: Option<&str>) -> Result<()> {
        warn!(
            party_id = %from,
            reason = reason.unwrap_or("unknown"),
            "Peer connection failed, advising reconnect"
        );
        self.send(from, ServerEvent::TryReconnect)
    }

    fn handle_chat(&self, role: Role, text: &str) -> Result<()> {
        let preview: String = text.chars().take(20).collect();
        info!(role = %role, preview = %preview, "Chat message");

        self.transport
            .broadcast(&self.registry.members(), &ServerEvent::chat(role, text));
        Ok(())
    }

    fn handle_transcription(&self, from: &PartyId, text: String) -> Result<()> {
        self.transport.broadcast(
            &self.registry.members(),
            &ServerEvent::Transcription {
                text,
                sender: from.clone(),
            },
        );
        Ok(())
    }

    fn handle_heartbeat(&self, from: &PartyId) -> Result<()> {
        debug!(party_id = %from, "Heartbeat");
        self.registry.touch(from);
        self.send(from, ServerEvent::heartbeat_ok())
    }

    fn send(&self, to: &PartyId, event: ServerEvent) -> Result<()> {
        self.transport.send(to, event)
    }

    /// Send where a failed delivery must not abort the caller
    fn deliver(&self, to: &PartyId, event: ServerEvent) {
        let name = event.name();
        if let Err(e) = self.transport.send(to, event) {
            warn!(party_id = %to, event = name, error = %e, "Failed to deliver event");
        }
    }
}
