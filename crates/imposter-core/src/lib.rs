//! Game rules shared by the Room Service and the offline mode.
//!
//! Everything here is pure: callers pass in the RNG, nothing touches the
//! network or the clock.
//!
//! - [`WordPackRegistry`]: the static catalog of word pairs
//! - [`assign_roles`] / [`Deal`]: who is an imposter and which words they get
//! - [`sanitize_name`]: display-name cleanup
//! - [`PassRound`]: the single-device pass-and-play flow

mod error;
mod names;
mod pass_and_play;
mod roles;
mod words;

pub use error::DealError;
pub use names::{same_name, sanitize_name};
pub use pass_and_play::{
    Advance, PASS_MAX_PLAYERS, PASS_MIN_PLAYERS, PassRound, PassSettings, RevealPhase, SeatCard,
};
pub use roles::{Deal, MIN_PLAYERS, assign_roles, clamp_imposters};
pub use words::{WordPack, WordPackRegistry, WordPair};
