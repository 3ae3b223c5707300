use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::id::PartyId;

/// Role of a party in the two-party session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// First to join; sends the offer
    Host,
    /// Second to join; answers
    Client,
}

impl Role {
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::Host)
    }

    /// Label used when tagging chat lines
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Client => "Client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One connected endpoint, owned exclusively by the session registry
#[derive(Debug, Clone)]
pub struct Party {
    pub id: PartyId,
    pub role: Role,
    /// Monotonic join time; the only failover tie-break
    pub joined_at: Instant,
    /// Wall-clock join time for status reporting
    pub joined_at_utc: DateTime<Utc>,
    /// Last time the party proved it was alive
    pub last_seen: DateTime<Utc>,
}

impl Party {
    #[must_use]
    pub fn new(id: PartyId, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id,
            role,
            joined_at: Instant::now(),
            joined_at_utc: now,
            last_seen: now,
        }
    }
}

/// Room occupancy, derived from membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Empty,
    WaitingForPeer,
    Paired,
}

impl RoomState {
    #[must_use]
    pub const fn from_member_count(count: usize) -> Self {
        match count {
            0 => Self::Empty,
            1 => Self::WaitingForPeer,
            _ => Self::Paired,
        }
    }
}

/// Point-in-time view of one member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    pub id: PartyId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Point-in-time view of the room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub state: RoomState,
    pub host_id: Option<PartyId>,
    pub members: Vec<MemberSnapshot>,
}
