//! Unified error type for the imposter crates.

use imposter_protocol::ProtocolError;
use imposter_room::RoomError;
use imposter_session::{ServiceError, SessionError};
use imposter_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ImposterError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Client step machine refused an action.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// A Room Service call failed, as seen by a client.
    #[error(transparent)]
    Service(#[from] ServiceError),
}
