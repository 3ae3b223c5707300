//! Session registry
//!
//! Tracks the single two-party room: who is in it, in what order they joined,
//! and which of them is the host. All mutation goes through [`SessionRegistry::join`]
//! and [`SessionRegistry::leave`], each of which holds the room lock for its
//! whole read-modify-write.

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{MemberSnapshot, Party, PartyId, Role, RoomSnapshot, RoomState};

/// Hard capacity of the room
pub const ROOM_CAPACITY: usize = 2;

/// Outcome of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub party_id: PartyId,
    pub role: Role,
    /// Host after the join (the new party itself when it became host)
    pub host_id: PartyId,
}

/// Outcome of removing a tracked party
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub party_id: PartyId,
    pub was_host: bool,
    /// Member promoted to host by this departure
    pub new_host: Option<PartyId>,
    /// Members still in the room, in join order
    pub remaining: Vec<PartyId>,
}

impl Departure {
    #[must_use]
    pub fn remaining_peer(&self) -> Option<&PartyId> {
        self.remaining.first()
    }
}

#[derive(Debug, Default)]
struct Room {
    /// Join order
    members: Vec<Party>,
    host_id: Option<PartyId>,
}

impl Room {
    fn position(&self, id: &PartyId) -> Option<usize> {
        self.members.iter().position(|party| party.id == *id)
    }

    /// Promote the member with the earliest join time
    fn promote_earliest(&mut self) -> Option<PartyId> {
        let next = self.members.iter_mut().min_by_key(|party| party.joined_at)?;
        next.role = Role::Host;
        self.host_id = Some(next.id.clone());
        self.host_id.clone()
    }
}

/// Process-wide registry of the one active room
#[derive(Debug, Default)]
pub struct SessionRegistry {
    room: Mutex<Room>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a newly connected party
    ///
    /// The first member becomes host, the second becomes client. A full room
    /// is left untouched.
    pub fn join(&self, id: PartyId) -> Result<Assignment> {
        let mut room = self.room.lock();

        if room.position(&id).is_some() {
            return Err(Error::AlreadyJoined(id));
        }
        if room.members.len() >= ROOM_CAPACITY {
            warn!(
                party_id = %id,
                members = room.members.len(),
                "Room full, rejecting party"
            );
            return Err(Error::RoomFull);
        }

        let role = if room.members.is_empty() {
            Role::Host
        } else {
            Role::Client
        };
        if role.is_host() {
            room.host_id = Some(id.clone());
        }
        room.members.push(Party::new(id.clone(), role));

        let host_id = room.host_id.clone().unwrap_or_else(|| id.clone());

        info!(
            party_id = %id,
            role = %role,
            members = room.members.len(),
            "Party joined room"
        );

        Ok(Assignment {
            party_id: id,
            role,
            host_id,
        })
    }

    /// Remove a party; unknown ids are ignored
    pub fn leave(&self, id: &PartyId) -> Option<Departure> {
        let mut room = self.room.lock();

        let Some(index) = room.position(id) else {
            debug!(party_id = %id, "Leave for untracked party ignored");
            return None;
        };
        let party = room.members.remove(index);
        let was_host = party.role.is_host();

        let new_host = if room.members.is_empty() {
            room.host_id = None;
            None
        } else if was_host {
            let promoted = room.promote_earliest();
            if let Some(promoted) = &promoted {
                info!(
                    old_host = %id,
                    new_host = %promoted,
                    "Promoted remaining party to host"
                );
            }
            promoted
        } else {
            None
        };

        info!(
            party_id = %id,
            was_host,
            members = room.members.len(),
            "Party left room"
        );

        Some(Departure {
            party_id: party.id,
            was_host,
            new_host,
            remaining: room.members.iter().map(|p| p.id.clone()).collect(),
        })
    }

    /// The other member of the room, if the room is paired and `id` is in it
    #[must_use]
    pub fn peer(&self, id: &PartyId) -> Option<PartyId> {
        let room = self.room.lock();
        if room.members.len() < 2 || room.position(id).is_none() {
            return None;
        }
        room.members
            .iter()
            .find(|party| party.id != *id)
            .map(|party| party.id.clone())
    }

    #[must_use]
    pub fn host_id(&self) -> Option<PartyId> {
        self.room.lock().host_id.clone()
    }

    #[must_use]
    pub fn is_host(&self, id: &PartyId) -> bool {
        self.room.lock().host_id.as_ref() == Some(id)
    }

    #[must_use]
    pub fn contains(&self, id: &PartyId) -> bool {
        self.room.lock().position(id).is_some()
    }

    #[must_use]
    pub fn role_of(&self, id: &PartyId) -> Option<Role> {
        let room = self.room.lock();
        room.position(id).map(|index| room.members[index].role)
    }

    /// Member ids in join order
    #[must_use]
    pub fn members(&self) -> Vec<PartyId> {
        self.room.lock().members.iter().map(|p| p.id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.room.lock().members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn state(&self) -> RoomState {
        RoomState::from_member_count(self.len())
    }

    /// Record liveness for a member; false if the party is not tracked
    pub fn touch(&self, id: &PartyId) -> bool {
        let mut room = self.room.lock();
        match room.position(id) {
            Some(index) => {
                room.members[index].last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        let room = self.room.lock();
        RoomSnapshot {
            state: RoomState::from_member_count(room.members.len()),
            host_id: room.host_id.clone(),
            members: room
                .members
                .iter()
                .map(|party| MemberSnapshot {
                    id: party.id.clone(),
                    role: party.role,
                    joined_at: party.joined_at_utc,
                    last_seen: party.last_seen,
                })
                .collect(),
        }
    }

    /// Check the room invariants; used by tests after every mutation
    #[cfg(test)]
    fn assert_invariants(&self) {
        let room = self.room.lock();
        assert!(room.members.len() <= ROOM_CAPACITY);

        let hosts: Vec<_> = room.members.iter().filter(|p| p.role.is_host()).collect();
        if room.members.is_empty() {
            assert!(room.host_id.is_none());
            assert!(hosts.is_empty());
        } else {
            assert_eq!(hosts.len(), 1, "exactly one host expected");
            assert_eq!(room.host_id.as_ref(), Some(&hosts[0].id));
            let earliest = room
                .members
                .iter()
                .min_by_key(|p| p.joined_at)
                .map(|p| p.id.clone());
            assert_eq!(room.host_id, earliest, "host must be the earliest joiner");
        }
    }
}
