//! Error types for the client session.

use std::fmt;

use imposter_core::DealError;

use crate::StepKind;

/// Failure reported by a [`RoomService`](crate::RoomService).
///
/// Both variants are shown to the user the same way for `create`, `join`
/// and `nextRound`; background sync swallows them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service understood the request and refused it (room not found,
    /// room full, not host, ...). `code` follows HTTP conventions.
    #[error("{message}")]
    Rejected { code: u16, message: String },

    /// The request never got a verdict: network down, timeout, service
    /// gone.
    #[error("network error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// The HTTP-style code, if the service answered at all.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            Self::Transport(_) => None,
        }
    }
}

/// A user action that talks to the Room Service and must not run twice at
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Join,
    NextRound,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Join => write!(f, "join"),
            Self::NextRound => write!(f, "next round"),
        }
    }
}

/// Errors returned by [`ClientSession`](crate::ClientSession) actions.
///
/// None of these corrupt state: on error the session stays in the step it
/// was in, with the message recorded on that step's form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("please enter your name")]
    MissingName,

    #[error("please enter a room code")]
    MissingRoomCode,

    #[error("\"{0}\" is not a valid room code")]
    InvalidRoomCode(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The same action is already waiting on the service.
    #[error("{0} is already in progress")]
    Busy(Action),

    /// The action doesn't exist in the current step.
    #[error("cannot {action} from the {step} screen")]
    InvalidStep { action: &'static str, step: StepKind },

    #[error("only the host can start the next round")]
    NotHost,

    /// The user left or navigated away while the request was in flight.
    #[error("the request finished after the session moved on")]
    Superseded,

    /// Pass-and-play dealing or reveal order.
    #[error(transparent)]
    Deal(#[from] DealError),
}
