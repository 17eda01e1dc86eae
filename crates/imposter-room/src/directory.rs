//! The in-process Room Service.

use std::sync::Arc;

use imposter_core::WordPackRegistry;
use imposter_protocol::{CreateRoom, JoinRoom, RoomChanged, RoomRequest, RoomView};
use imposter_session::{RoomService, ServiceError};
use tokio::sync::{Mutex, broadcast};

use crate::{LeaveOutcome, RoomConfig, RoomError, RoomManager};

/// Capacity of the change-notice broadcast. Slow subscribers see
/// `Lagged` and simply resync.
const CHANGE_CHANNEL_SIZE: usize = 256;

/// Every live room, reachable by code.
///
/// This is the authoritative store behind the WebSocket server, and a
/// complete [`RoomService`] on its own for single-process use.
pub struct RoomDirectory {
    manager: Mutex<RoomManager>,
    changes: broadcast::Sender<RoomChanged>,
    config: RoomConfig,
}

impl RoomDirectory {
    /// A directory over the built-in word packs.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_registry(config, WordPackRegistry::builtin())
    }

    pub fn with_registry(config: RoomConfig, registry: WordPackRegistry) -> Self {
        let config = config.normalized();
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        let manager = RoomManager::new(config.clone(), Arc::new(registry), changes.clone());
        Self {
            manager: Mutex::new(manager),
            changes,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub async fn create(&self, req: CreateRoom) -> Result<RoomView, RoomError> {
        let (_, view) = self.manager.lock().await.create_room(&req)?;
        Ok(view)
    }

    pub async fn join(&self, req: JoinRoom) -> Result<RoomView, RoomError> {
        let handle = self.manager.lock().await.handle(&req.room_id)?;
        handle.join(req.name).await
    }

    pub async fn next_round(&self, req: RoomRequest) -> Result<RoomView, RoomError> {
        let handle = self.manager.lock().await.handle(&req.room_id)?;
        handle.next_round(req.player_id, req.locale).await
    }

    pub async fn sync(&self, req: RoomRequest) -> Result<RoomView, RoomError> {
        let handle = self.manager.lock().await.handle(&req.room_id)?;
        handle.view(req.player_id).await
    }

    /// Removes the player; destroys the room if they were the last one.
    pub async fn leave(&self, req: RoomRequest) -> Result<LeaveOutcome, RoomError> {
        let handle = self.manager.lock().await.handle(&req.room_id)?;
        let outcome = handle.leave(req.player_id).await?;
        if outcome == LeaveOutcome::Empty {
            self.manager.lock().await.remove(&req.room_id);
            tracing::info!(room_id = %req.room_id, "room destroyed (empty)");
        }
        Ok(outcome)
    }

    /// A fresh receiver of change notices for every room.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<RoomChanged> {
        self.changes.subscribe()
    }

    pub async fn room_count(&self) -> usize {
        self.manager.lock().await.room_count()
    }

    /// Destroys rooms idle for at least `idle_ttl`. Returns how many went.
    ///
    /// Rooms whose actor already stopped are dropped from the index too.
    pub async fn evict_idle(&self) -> usize {
        let handles = self.manager.lock().await.room_handles();
        let mut evicted = 0;

        for handle in handles {
            let stale = match handle.info().await {
                Ok(info) => info.idle_for >= self.config.idle_ttl,
                Err(_) => true,
            };
            if !stale {
                continue;
            }
            // Unindex under the lock, then stop the actor without it.
            let Some(handle) = self.manager.lock().await.remove(handle.room_id()) else {
                continue;
            };
            // Already stopped is fine.
            let _ = handle.shutdown().await;
            tracing::info!(room_id = %handle.room_id(), "room evicted");
            evicted += 1;
        }

        if evicted > 0 {
            tracing::info!(evicted, "idle rooms evicted");
        }
        evicted
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

impl RoomService for RoomDirectory {
    async fn create(&self, req: CreateRoom) -> Result<RoomView, ServiceError> {
        Ok(RoomDirectory::create(self, req).await?)
    }

    async fn join(&self, req: JoinRoom) -> Result<RoomView, ServiceError> {
        Ok(RoomDirectory::join(self, req).await?)
    }

    async fn next_round(&self, req: RoomRequest) -> Result<RoomView, ServiceError> {
        Ok(RoomDirectory::next_round(self, req).await?)
    }

    async fn sync(&self, req: RoomRequest) -> Result<RoomView, ServiceError> {
        Ok(RoomDirectory::sync(self, req).await?)
    }

    async fn leave(&self, req: RoomRequest) -> Result<(), ServiceError> {
        RoomDirectory::leave(self, req).await?;
        Ok(())
    }

    fn notifications(&self) -> Option<broadcast::Receiver<RoomChanged>> {
        Some(self.subscribe_changes())
    }
}
