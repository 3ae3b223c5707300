use thiserror::Error;

use crate::models::PartyId;

#[derive(Error, Debug)]
pub enum Error {
    /// The room already holds two parties; the connection is refused.
    #[error("Room is full")]
    RoomFull,

    #[error("Party already joined: {0}")]
    AlreadyJoined(PartyId),

    /// A signaling message arrived with no valid counterpart to receive it.
    #[error("No eligible recipient for {0}")]
    NoEligibleRecipient(&'static str),

    #[error("Unknown party: {0}")]
    UnknownParty(PartyId),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Errors that are routine observability events rather than faults.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NoEligibleRecipient(_) | Self::UnknownParty(_) | Self::InvalidMessage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
