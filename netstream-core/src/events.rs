//! Wire events exchanged with connected parties
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.
//! `data` may be omitted for events that carry no payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{PartyId, Role};

/// Raw inbound frame before the payload is interpreted
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Events sent by a party to the relay
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Local media acquired, party can take part in negotiation
    ReadyForConnection,
    /// Host session description (opaque)
    Offer { offer: Value },
    /// Client session description (opaque)
    Answer { answer: Value },
    /// Connectivity candidate (opaque)
    Candidate { candidate: Value },
    /// The party's peer connection failed
    ConnectionFailed { reason: Option<String> },
    /// Raw chat text
    ChatMessage(String),
    /// Finalized speech-to-text fragment
    Transcription { text: String },
    Heartbeat,
}

impl ClientEvent {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| Error::InvalidMessage(format!("malformed frame: {e}")))?;
        Self::from_parts(&envelope.event, envelope.data)
    }

    /// Build an event from its name and payload
    pub fn from_parts(event: &str, mut data: Value) -> Result<Self> {
        match event {
            "ready-for-connection" => Ok(Self::ReadyForConnection),
            "offer" => Ok(Self::Offer {
                offer: take_field(&mut data, event, "offer")?,
            }),
            "answer" => Ok(Self::Answer {
                answer: take_field(&mut data, event, "answer")?,
            }),
            "candidate" => Ok(Self::Candidate {
                candidate: take_field(&mut data, event, "candidate")?,
            }),
            "connection-failed" => Ok(Self::ConnectionFailed {
                reason: data
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            "chat-message" => match data {
                Value::String(text) => Ok(Self::ChatMessage(text)),
                _ => Err(Error::InvalidMessage(
                    "chat-message expects a string payload".to_string(),
                )),
            },
            "transcription" => match take_field(&mut data, event, "text")? {
                Value::String(text) => Ok(Self::Transcription { text }),
                _ => Err(Error::InvalidMessage(
                    "transcription text must be a string".to_string(),
                )),
            },
            "heartbeat" => Ok(Self::Heartbeat),
            other => Err(Error::InvalidMessage(format!("unknown event: {other}"))),
        }
    }

    /// Event name for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadyForConnection => "ready-for-connection",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::ConnectionFailed { .. } => "connection-failed",
            Self::ChatMessage(_) => "chat-message",
            Self::Transcription { .. } => "transcription",
            Self::Heartbeat => "heartbeat",
        }
    }
}

fn take_field(data: &mut Value, event: &str, key: &str) -> Result<Value> {
    data.as_object_mut()
        .and_then(|fields| fields.remove(key))
        .ok_or_else(|| Error::InvalidMessage(format!("{event} is missing field `{key}`")))
}

/// Events sent by the relay to a party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoleAssigned { is_host: bool },

    #[serde(rename_all = "camelCase")]
    UserConnected { user_id: PartyId },

    #[serde(rename_all = "camelCase")]
    UserDisconnected { user_id: PartyId },

    #[serde(rename_all = "camelCase")]
    HostChanged { new_host: bool },

    #[serde(rename_all = "camelCase")]
    InitiateConnection { host_id: PartyId },

    Offer { offer: Value },

    Answer { answer: Value },

    Candidate { candidate: Value },

    TryReconnect,

    /// Already tagged with the sender's role: `"Host: hello"`
    ChatMessage(String),

    Transcription { text: String, sender: PartyId },

    HeartbeatResponse { status: String },

    Error { message: String },
}

impl ServerEvent {
    #[must_use]
    pub const fn role_assigned(role: Role) -> Self {
        Self::RoleAssigned {
            is_host: role.is_host(),
        }
    }

    #[must_use]
    pub fn chat(role: Role, text: &str) -> Self {
        Self::ChatMessage(format!("{}: {text}", role.label()))
    }

    #[must_use]
    pub fn heartbeat_ok() -> Self {
        Self::HeartbeatResponse {
            status: "ok".to_string(),
        }
    }

    #[must_use]
    pub fn room_full() -> Self {
        Self::Error {
            message: Error::RoomFull.to_string(),
        }
    }

    /// Event name for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RoleAssigned { .. } => "role-assigned",
            Self::UserConnected { .. } => "user-connected",
            Self::UserDisconnected { .. } => "user-disconnected",
            Self::HostChanged { .. } => "host-changed",
            Self::InitiateConnection { .. } => "initiate-connection",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::TryReconnect => "try-reconnect",
            Self::ChatMessage(_) => "chat-message",
            Self::Transcription { .. } => "transcription",
            Self::HeartbeatResponse { .. } => "heartbeat-response",
            Self::Error { .. } => "error",
        }
    }

    /// Encode as a text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payloadless_events() {
        assert_eq!(
            ClientEvent::decode(r#"{"event":"ready-for-connection"}"#).unwrap(),
            ClientEvent::ReadyForConnection
        );
        // Socket clients often send an empty object for "no payload"
        assert_eq!(
            ClientEvent::decode(r#"{"event":"heartbeat","data":{}}"#).unwrap(),
            ClientEvent::Heartbeat
        );
    }

    #[test]
    fn test_decode_keeps_opaque_payload_intact() {
        let sdp = json!({"type": "offer", "sdp": "v=0\r\no=- 46117 2 IN IP4 127.0.0.1\r\n"});
        let frame = json!({"event": "offer", "data": {"offer": sdp.clone()}}).to_string();

        assert_eq!(
            ClientEvent::decode(&frame).unwrap(),
            ClientEvent::Offer { offer: sdp }
        );
    }

    #[test]
    fn test_decode_chat_and_transcription() {
        assert_eq!(
            ClientEvent::decode(r#"{"event":"chat-message","data":"hello"}"#).unwrap(),
            ClientEvent::ChatMessage("hello".to_string())
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"transcription","data":{"text":"good morning"}}"#)
                .unwrap(),
            ClientEvent::Transcription {
                text: "good morning".to_string()
            }
        );
    }

    #[test]
    fn test_decode_connection_failed_reason_is_optional() {
        assert_eq!(
            ClientEvent::decode(r#"{"event":"connection-failed","data":{"reason":"ice-failed"}}"#)
                .unwrap(),
            ClientEvent::ConnectionFailed {
                reason: Some("ice-failed".to_string())
            }
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"connection-failed"}"#).unwrap(),
            ClientEvent::ConnectionFailed { reason: None }
        );
    }

    #[test]
    fn test_decode_rejects_bad_frames() {
        assert!(matches!(
            ClientEvent::decode("not json"),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            ClientEvent::decode(r#"{"event":"self-destruct"}"#),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            ClientEvent::decode(r#"{"event":"offer","data":{}}"#),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            ClientEvent::decode(r#"{"event":"chat-message","data":{"text":"hi"}}"#),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_server_event_wire_names() {
        let value = serde_json::to_value(ServerEvent::role_assigned(Role::Host)).unwrap();
        assert_eq!(value, json!({"event": "role-assigned", "data": {"isHost": true}}));

        let value = serde_json::to_value(ServerEvent::InitiateConnection {
            host_id: PartyId::from("A"),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"event": "initiate-connection", "data": {"hostId": "A"}})
        );

        let value = serde_json::to_value(ServerEvent::HostChanged { new_host: true }).unwrap();
        assert_eq!(value, json!({"event": "host-changed", "data": {"newHost": true}}));

        let value = serde_json::to_value(ServerEvent::TryReconnect).unwrap();
        assert_eq!(value, json!({"event": "try-reconnect"}));
    }

    #[test]
    fn test_chat_is_tagged_with_role() {
        let value = serde_json::to_value(ServerEvent::chat(Role::Host, "hello")).unwrap();
        assert_eq!(value, json!({"event": "chat-message", "data": "Host: hello"}));
    }

    #[test]
    fn test_room_full_message() {
        assert_eq!(
            ServerEvent::room_full(),
            ServerEvent::Error {
                message: "Room is full".to_string()
            }
        );
    }
}
