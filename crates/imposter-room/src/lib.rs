//! Authoritative Room Service.
//!
//! ```text
//! RoomDirectory ──lock──► RoomManager { code → RoomHandle }
//!       │                                   │ mpsc
//!       └── broadcast<RoomChanged> ◄── RoomActor { RoomRecord }
//! ```
//!
//! One actor task per room serializes every request for that room. The
//! directory only holds its lock to look a room up, so rooms never wait on
//! each other.

mod config;
mod directory;
mod error;
mod manager;
mod record;
mod room;

pub use config::{RoomConfig, RoomPhase};
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use manager::RoomManager;
pub use record::{LeaveOutcome, RoomRecord};
pub use room::{RoomHandle, RoomInfo};
