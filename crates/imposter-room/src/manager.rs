//! Room manager: owns the code → actor index.

use std::collections::HashMap;
use std::sync::Arc;

use imposter_core::WordPackRegistry;
use imposter_protocol::{CreateRoom, RoomChanged, RoomCode, RoomView};
use tokio::sync::broadcast;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, RoomRecord};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Attempts at drawing an unused code before giving up.
const MAX_CODE_ATTEMPTS: usize = 64;

/// Tracks every live room by its code.
///
/// Plain data; [`RoomDirectory`](crate::RoomDirectory) wraps it in a mutex
/// and only holds the lock for index updates, never while a room works.
pub struct RoomManager {
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
    registry: Arc<WordPackRegistry>,
    changes: broadcast::Sender<RoomChanged>,
}

impl RoomManager {
    pub fn new(
        config: RoomConfig,
        registry: Arc<WordPackRegistry>,
        changes: broadcast::Sender<RoomChanged>,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
            registry,
            changes,
        }
    }

    /// Creates a room under a fresh code and returns the host's view.
    pub fn create_room(&mut self, req: &CreateRoom) -> Result<(RoomHandle, RoomView), RoomError> {
        let mut rng = rand::rng();
        let room_id = self.unused_code(&mut rng)?;
        let (record, host) = RoomRecord::create(
            room_id.clone(),
            req,
            self.config.clone(),
            &self.registry,
            &mut rng,
        )?;
        let view = record.view(&host)?;

        let handle = spawn_room(
            record,
            Arc::clone(&self.registry),
            self.changes.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, host = %host, pack = %req.pack_id, "room created");
        Ok((handle, view))
    }

    /// Looks up a live room.
    pub fn handle(&self, room_id: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Drops a room from the index without touching its actor.
    pub fn remove(&mut self, room_id: &RoomCode) -> Option<RoomHandle> {
        self.rooms.remove(room_id)
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, handle: RoomHandle) {
        self.rooms.insert(handle.room_id().clone(), handle);
    }

    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    fn unused_code<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<RoomCode, RoomError> {
        first_unused(|| RoomCode::random(&mut *rng), |code| self.rooms.contains_key(code))
    }
}

/// Draws candidates until one isn't taken, giving up after
/// `MAX_CODE_ATTEMPTS`.
fn first_unused(
    mut draw: impl FnMut() -> RoomCode,
    taken: impl Fn(&RoomCode) -> bool,
) -> Result<RoomCode, RoomError> {
    (0..MAX_CODE_ATTEMPTS)
        .map(|_| draw())
        .find(|code| !taken(code))
        .ok_or(RoomError::CodeSpaceExhausted)
}
