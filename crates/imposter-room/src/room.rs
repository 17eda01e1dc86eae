//! Room actor: one Tokio task per room, owning its [`RoomRecord`].
//!
//! Every operation on a room is a command on its mpsc channel, so requests
//! for the same room are applied one at a time in arrival order and the
//! record never needs a lock. State-changing commands also publish a
//! [`RoomChanged`] notice on the directory-wide broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use imposter_core::WordPackRegistry;
use imposter_protocol::{Locale, PlayerId, RoomChanged, RoomCode, RoomView};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use crate::{LeaveOutcome, RoomError, RoomPhase, RoomRecord};

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        name: String,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    NextRound {
        player_id: PlayerId,
        locale: Locale,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    /// Read-only; does not count as activity for eviction.
    View {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata (never roles or words).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomCode,
    pub phase: RoomPhase,
    pub round: u32,
    pub player_count: usize,
    pub max_players: usize,
    /// Time since the last join, deal or leave.
    pub idle_for: Duration,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. If the actor has
/// stopped, every call fails with [`RoomError::Unavailable`].
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    #[cfg(test)]
    pub(crate) fn from_sender(room_id: RoomCode, sender: mpsc::Sender<RoomCommand>) -> Self {
        Self { room_id, sender }
    }

    pub fn room_id(&self) -> &RoomCode {
        &self.room_id
    }

    /// Adds a player and returns their first view.
    pub async fn join(&self, name: String) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::Join { name, reply }).await?
    }

    /// Deals the next round on behalf of `player_id` (must be host).
    pub async fn next_round(
        &self,
        player_id: PlayerId,
        locale: Locale,
    ) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::NextRound {
            player_id,
            locale,
            reply,
        })
        .await?
    }

    pub async fn view(&self, player_id: PlayerId) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::View { player_id, reply })
            .await?
    }

    /// Removes a player. The actor stops by itself once the room is empty.
    pub async fn leave(&self, player_id: PlayerId) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    record: RoomRecord,
    registry: Arc<WordPackRegistry>,
    changes: broadcast::Sender<RoomChanged>,
    last_active: Instant,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_id = self.record.room_id().clone();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { name, reply } => {
                    let result = self.handle_join(&name);
                    let _ = reply.send(result);
                }
                RoomCommand::NextRound {
                    player_id,
                    locale,
                    reply,
                } => {
                    let result = self.handle_next_round(&player_id, &locale);
                    let _ = reply.send(result);
                }
                RoomCommand::View { player_id, reply } => {
                    let _ = reply.send(self.record.view(&player_id));
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(&player_id);
                    let empty = matches!(result, Ok(LeaveOutcome::Empty));
                    let _ = reply.send(result);
                    if empty {
                        break;
                    }
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    fn handle_join(&mut self, name: &str) -> Result<RoomView, RoomError> {
        let player_id = self
            .record
            .join(name, &self.registry, &mut rand::rng())?;
        tracing::info!(
            room_id = %self.record.room_id(),
            %player_id,
            players = self.record.player_count(),
            phase = %self.record.phase(),
            "player joined"
        );
        self.touch();
        self.record.view(&player_id)
    }

    fn handle_next_round(
        &mut self,
        player_id: &PlayerId,
        locale: &Locale,
    ) -> Result<RoomView, RoomError> {
        self.record
            .next_round(player_id, locale, &self.registry, &mut rand::rng())?;
        tracing::info!(
            room_id = %self.record.room_id(),
            round = self.record.round(),
            players = self.record.player_count(),
            "round dealt"
        );
        self.touch();
        self.record.view(player_id)
    }

    fn handle_leave(&mut self, player_id: &PlayerId) -> Result<LeaveOutcome, RoomError> {
        let outcome = self.record.leave(player_id)?;
        tracing::info!(
            room_id = %self.record.room_id(),
            %player_id,
            players = self.record.player_count(),
            "player left"
        );
        if let LeaveOutcome::HostTransferred(host) = &outcome {
            tracing::info!(room_id = %self.record.room_id(), %host, "host transferred");
        }
        self.touch();
        Ok(outcome)
    }

    /// Records activity and tells watchers the room changed.
    fn touch(&mut self) {
        self.last_active = Instant::now();
        // No subscribers is fine.
        let _ = self.changes.send(RoomChanged {
            room_id: self.record.room_id().clone(),
            round: self.record.round(),
        });
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.record.room_id().clone(),
            phase: self.record.phase(),
            round: self.record.round(),
            player_count: self.record.player_count(),
            max_players: self.record.max_players(),
            idle_for: self.last_active.elapsed(),
        }
    }
}

/// Spawns a room actor for `record` and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(
    record: RoomRecord,
    registry: Arc<WordPackRegistry>,
    changes: broadcast::Sender<RoomChanged>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let room_id = record.room_id().clone();

    let actor = RoomActor {
        record,
        registry,
        changes,
        last_active: Instant::now(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
