//! Error types for the room layer.

use imposter_core::DealError;
use imposter_protocol::{PackId, PlayerId, RoomCode};
use imposter_session::ServiceError;

/// Errors that can occur during room operations.
///
/// Messages are user-facing: clients show them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Another player in the room already uses this name (case-insensitive).
    #[error("the name {0:?} is already taken in this room")]
    NameTaken(String),

    #[error("only the host can start the next round")]
    NotHost,

    /// The player id is not (or no longer) a member of the room.
    #[error("player {0} is not in room {1}")]
    PlayerNotFound(PlayerId, RoomCode),

    #[error("at least {min} players are needed, the room has {players}")]
    NotEnoughPlayers { players: usize, min: usize },

    /// Nothing printable was left after sanitizing the display name.
    #[error("please enter a name")]
    InvalidName,

    #[error("unknown word pack {0}")]
    UnknownPack(PackId),

    /// No unused room code could be generated.
    #[error("no free room code, try again later")]
    CodeSpaceExhausted,

    /// The room's actor is gone (closed or evicted mid-request).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    #[error(transparent)]
    Deal(#[from] DealError),
}

impl RoomError {
    /// HTTP-style status code sent on the wire.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidName | Self::UnknownPack(_) => 400,
            Self::NotHost => 403,
            Self::NotFound(_) | Self::PlayerNotFound(..) => 404,
            Self::RoomFull(_) | Self::NameTaken(_) | Self::NotEnoughPlayers { .. } => 409,
            Self::Deal(DealError::UnknownPack(_) | DealError::EmptyPack(_)) => 400,
            Self::Deal(_) => 409,
            Self::CodeSpaceExhausted | Self::Unavailable(_) => 503,
        }
    }
}

impl From<RoomError> for ServiceError {
    fn from(err: RoomError) -> Self {
        ServiceError::rejected(err.code(), err.to_string())
    }
}
