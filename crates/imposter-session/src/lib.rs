//! Client side of the imposter room protocol.
//!
//! ```text
//! UI  ──actions──►  ClientSession  ──create/join/nextRound──►  RoomService
//!                        ▲                                          │
//!                        └────── RoomSync (interval / push) ◄──sync─┘
//! ```
//!
//! - [`RoomService`]: the contract any room backend satisfies
//! - [`ClientSession`]: the step machine (`Mode → Create/Join → Room`, plus
//!   the offline `PassSetup → PassReveal → PassSummary` branch)
//! - [`RoomSync`] / [`SyncTrigger`] / [`reconcile`]: background refresh
//!   that never applies a view from an older round
//! - [`invite_link`] / [`share_invite`]: invites with graceful fallback

mod client;
mod config;
mod error;
mod in_flight;
mod invite;
mod service;
mod step;
mod sync;

pub use client::ClientSession;
pub use config::{SessionConfig, SyncConfig};
pub use error::{Action, ServiceError, SessionError};
pub use in_flight::{InFlight, InFlightGuard};
pub use invite::{
    ROOM_PARAM, ShareOutcome, ShareTarget, ShareUnavailable, invite_link, room_code_from_url,
    share_invite,
};
pub use service::RoomService;
pub use step::{CreateForm, JoinForm, PassCard, PassSetupForm, RoomScreen, Step, StepKind};
pub use sync::{RoomSync, SyncHandle, SyncTrigger, Wake, is_fresh, reconcile};
