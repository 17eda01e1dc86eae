//! The screens a client can be on, as one tagged union.
//!
//! Each variant owns exactly the data its screen needs, so a session can't
//! hold a room while sitting on the create form, or a pass-and-play round
//! while in a networked room.
//!
//! ```text
//!          ┌──► Create ──submit──┐
//!   Mode ──┼──► Join ────submit──┴──► Room ──leave──► Mode
//!          └──► PassSetup ──start──► PassReveal ──last seat──► PassSummary
//!                                        ▲                         │
//!                                        └────────new round────────┘
//! ```

use std::fmt;

use imposter_core::{PassRound, PassSettings};
use imposter_protocol::{PackId, Role, RoomView};

/// Host form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateForm {
    pub name: String,
    pub pack_id: PackId,
    pub imposters: usize,
    /// Message from the last failed submit.
    pub error: Option<String>,
}

impl Default for CreateForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            pack_id: PackId::default(),
            imposters: 1,
            error: None,
        }
    }
}

/// Join form. `room_code` is raw user input until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub room_code: String,
    pub name: String,
    pub error: Option<String>,
}

/// The steady-state room screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomScreen {
    /// Last view accepted from the service.
    pub view: RoomView,
    /// Message from the last failed `nextRound`. Sync never sets it.
    pub error: Option<String>,
}

/// Pass-and-play setup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSetupForm {
    pub settings: PassSettings,
    pub error: Option<String>,
}

/// An owned copy of the one card on screen during pass-and-play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassCard {
    pub seat: usize,
    pub role: Role,
    pub word: String,
}

/// Where a client session currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Step {
    /// Choosing host, join or pass-and-play.
    #[default]
    Mode,
    Create(CreateForm),
    Join(JoinForm),
    Room(RoomScreen),
    PassSetup(PassSetupForm),
    /// Handing the device from seat to seat.
    PassReveal(PassRound),
    /// Every seat has seen its word; discuss and vote aloud.
    PassSummary(PassRound),
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Mode => StepKind::Mode,
            Self::Create(_) => StepKind::Create,
            Self::Join(_) => StepKind::Join,
            Self::Room(_) => StepKind::Room,
            Self::PassSetup(_) => StepKind::PassSetup,
            Self::PassReveal(_) => StepKind::PassReveal,
            Self::PassSummary(_) => StepKind::PassSummary,
        }
    }

    /// The room view, if in a networked room.
    pub fn room(&self) -> Option<&RoomView> {
        match self {
            Self::Room(screen) => Some(&screen.view),
            _ => None,
        }
    }

    /// The error shown on the current screen, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Create(f) => f.error.as_deref(),
            Self::Join(f) => f.error.as_deref(),
            Self::Room(s) => s.error.as_deref(),
            Self::PassSetup(f) => f.error.as_deref(),
            Self::Mode | Self::PassReveal(_) | Self::PassSummary(_) => None,
        }
    }
}

/// Data-free discriminant of [`Step`], for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Mode,
    Create,
    Join,
    Room,
    PassSetup,
    PassReveal,
    PassSummary,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mode => "mode",
            Self::Create => "create",
            Self::Join => "join",
            Self::Room => "room",
            Self::PassSetup => "pass setup",
            Self::PassReveal => "pass reveal",
            Self::PassSummary => "pass summary",
        };
        f.write_str(name)
    }
}
