//! # Imposter
//!
//! Room service for the imposter party game: one player hosts, friends join
//! with a short code, and each round every player privately sees either the
//! common word or (for the imposters) a related decoy.
//!
//! This crate ties the layers together:
//!
//! - [`ImposterServer`]: WebSocket server over the in-process
//!   [`RoomDirectory`](imposter_room::RoomDirectory)
//! - [`RemoteRoomService`]: the matching client, usable wherever a
//!   [`RoomService`](imposter_session::RoomService) is expected, e.g. by
//!   [`ClientSession`](imposter_session::ClientSession)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use imposter::prelude::*;
//!
//! # async fn run() -> Result<(), ImposterError> {
//! let service = RemoteRoomService::connect("ws://127.0.0.1:8080", ClientConfig::default()).await?;
//! let session = ClientSession::new(Arc::new(service), SessionConfig::default());
//! session.choose_host()?;
//! session.edit_create(|form| form.name = "Ana".into())?;
//! let view = session.submit_create().await?;
//! println!("share this code: {}", view.room_id);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod handler;
mod server;

pub use client::{ClientConfig, RemoteRoomService};
pub use error::ImposterError;
pub use server::{ImposterServer, ImposterServerBuilder, ServerConfig};

pub mod prelude {
    pub use crate::{
        ClientConfig, ImposterError, ImposterServer, ImposterServerBuilder, RemoteRoomService,
        ServerConfig,
    };
    pub use imposter_core::{WordPackRegistry, sanitize_name};
    pub use imposter_protocol::{
        ClientMessage, CreateRoom, Envelope, JoinRoom, Locale, PackId, PlayerId, Role, RoomChanged,
        RoomCode, RoomRequest, RoomView, ServerMessage,
    };
    pub use imposter_room::{RoomConfig, RoomDirectory, RoomError};
    pub use imposter_session::{
        ClientSession, RoomService, ServiceError, SessionConfig, SessionError, Step, StepKind,
        SyncConfig, invite_link,
    };
}
