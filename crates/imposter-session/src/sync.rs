//! Room Synchronization Client.
//!
//! A background task that keeps one player's [`RoomView`] fresh. What wakes
//! it ([`SyncTrigger`]: a timer, push notices, or both) is separate from
//! what it does with the answer ([`reconcile`]), so the stale-round rule is
//! the same whichever trigger fired.
//!
//! Sync is silent: failures are logged at `debug` and retried on the next
//! wake-up. Nothing here ever reports an error to the user.

use std::sync::Arc;
use std::time::Duration;

use imposter_protocol::{RoomChanged, RoomCode, RoomRequest, RoomView};
use rand::Rng;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::{RoomService, SyncConfig};

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Whether a response for `incoming` round may replace state at `current`.
///
/// Responses can race, so the round number decides, not arrival order.
/// Equal rounds are applied: the roster may have changed within a round.
pub fn is_fresh(current: u32, incoming: u32) -> bool {
    incoming >= current
}

/// Replaces `current` with `incoming` unless `incoming` is from an older
/// round. Returns `true` if it was applied.
pub fn reconcile(current: &mut RoomView, incoming: RoomView) -> bool {
    if !is_fresh(current.round, incoming.round) {
        tracing::debug!(
            room_id = %incoming.room_id,
            current = current.round,
            stale = incoming.round,
            "discarding stale room view"
        );
        return false;
    }
    *current = incoming;
    true
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// Why the sync loop woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Interval,
    /// A push notice for this room (or notices were dropped and one of
    /// them may have been for this room).
    Push,
}

/// Decides when the next sync happens.
///
/// The timer starts lazily on the first [`wait`](Self::wait), one period
/// plus a random jitter out. Missed ticks are skipped rather than bunched
/// up, so a suspended laptop doesn't fire a burst of syncs on wake.
pub struct SyncTrigger {
    room_id: RoomCode,
    period: Duration,
    jitter: Duration,
    interval: Option<Interval>,
    push: Option<broadcast::Receiver<RoomChanged>>,
}

impl SyncTrigger {
    /// `push` is only used when `config.push` is set.
    pub fn new(
        config: &SyncConfig,
        room_id: RoomCode,
        push: Option<broadcast::Receiver<RoomChanged>>,
    ) -> Self {
        let jitter = if config.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = config.initial_jitter.as_millis() as u64;
            Duration::from_millis(rand::rng().random_range(0..=max))
        };
        Self {
            room_id,
            period: config.interval,
            jitter,
            interval: None,
            push: push.filter(|_| config.push),
        }
    }

    /// Whether push notices are still being listened to.
    pub fn has_push(&self) -> bool {
        self.push.is_some()
    }

    /// Waits for the next reason to sync.
    ///
    /// Notices for other rooms are skipped. A closed push channel drops
    /// back to the timer alone.
    pub async fn wait(&mut self) -> Wake {
        let Self {
            room_id,
            period,
            jitter,
            interval,
            push,
        } = self;
        let interval = interval.get_or_insert_with(|| {
            let mut interval = time::interval_at(Instant::now() + *period + *jitter, *period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            let Some(rx) = push.as_mut() else {
                interval.tick().await;
                return Wake::Interval;
            };

            let notice = tokio::select! {
                _ = interval.tick() => return Wake::Interval,
                notice = rx.recv() => notice,
            };

            match notice {
                Ok(changed) if changed.room_id == *room_id => return Wake::Push,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%room_id, skipped, "room notices lagged");
                    return Wake::Push;
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(%room_id, "push channel closed; polling only");
                    *push = None;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

/// Spawns and owns a background sync loop.
pub struct RoomSync;

impl RoomSync {
    /// Starts syncing `request`'s seat, handing every successful response
    /// to `on_view`.
    ///
    /// `on_view` receives every view the service returns; apply
    /// [`reconcile`] inside it. Must be called from within a Tokio runtime.
    pub fn spawn<S, F>(
        service: Arc<S>,
        request: RoomRequest,
        mut trigger: SyncTrigger,
        mut on_view: F,
    ) -> SyncHandle
    where
        S: RoomService,
        F: FnMut(RoomView) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let room_id = request.room_id.clone();
        let player_id = request.player_id.clone();

        let task = tokio::spawn(async move {
            tracing::debug!(%room_id, %player_id, "room sync started");
            loop {
                let wake = tokio::select! {
                    _ = &mut stop_rx => break,
                    wake = trigger.wait() => wake,
                };

                let result = tokio::select! {
                    _ = &mut stop_rx => break,
                    result = service.sync(request.clone()) => result,
                };

                match result {
                    Ok(view) => on_view(view),
                    Err(e) => {
                        tracing::debug!(%room_id, ?wake, error = %e, "background sync failed");
                    }
                }
            }
            tracing::debug!(%room_id, %player_id, "room sync stopped");
        });

        SyncHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Stops the sync loop when told to, or when dropped.
#[derive(Debug)]
pub struct SyncHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stops the loop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use imposter_protocol::{PackId, PlayerId, Role};

    use super::*;

    fn view(round: u32) -> RoomView {
        RoomView {
            room_id: RoomCode::parse("K7QX2M").unwrap(),
            player_id: PlayerId("p1".into()),
            name: "Ana".into(),
            is_host: false,
            round,
            role: Some(Role::Crew),
            word: Some(format!("word-{round}")),
            pack_id: PackId::default(),
            imposters: 1,
            players: vec![],
        }
    }

    fn config() -> SyncConfig {
        SyncConfig {
            interval: Duration::from_secs(3),
            initial_jitter: Duration::ZERO,
            push: true,
        }
    }

    // =========================================================================
    // reconcile
    // =========================================================================

    #[test]
    fn test_reconcile_applies_same_or_newer_round() {
        let mut current = view(2);
        let mut same = view(2);
        same.word = Some("updated".into());

        assert!(reconcile(&mut current, same));
        assert_eq!(current.word.as_deref(), Some("updated"));

        assert!(reconcile(&mut current, view(3)));
        assert_eq!(current.round, 3);
    }

    #[test]
    fn test_reconcile_discards_older_round() {
        let mut current = view(2);
        assert!(!reconcile(&mut current, view(1)));
        assert_eq!(current, view(2));
    }

    #[test]
    fn test_reconcile_lower_round_overwritten() {
        let mut current = view(1);
        assert!(reconcile(&mut current, view(2)));
        assert_eq!(current.round, 2);
    }

    // =========================================================================
    // SyncTrigger
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_trigger_first_fire_after_one_period() {
        let mut trigger = SyncTrigger::new(&config(), view(1).room_id, None);
        let start = Instant::now();

        assert_eq!(trigger.wait().await, Wake::Interval);
        let first = start.elapsed();
        assert!(first >= Duration::from_secs(3) && first < Duration::from_millis(3010));

        trigger.wait().await;
        let second = start.elapsed();
        assert!(second >= Duration::from_secs(6) && second < Duration::from_millis(6010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_jitter_bounded() {
        let cfg = SyncConfig {
            initial_jitter: Duration::from_millis(500),
            ..config()
        };
        let mut trigger = SyncTrigger::new(&cfg, view(1).room_id, None);
        let start = Instant::now();

        trigger.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed <= Duration::from_millis(3510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_wakes_on_matching_push() {
        let (tx, rx) = broadcast::channel(8);
        let mut trigger = SyncTrigger::new(&config(), view(1).room_id, Some(rx));
        let start = Instant::now();

        tx.send(RoomChanged {
            room_id: RoomCode::parse("ZZZZZZ").unwrap(),
            round: 4,
        })
        .unwrap();
        tx.send(RoomChanged {
            room_id: view(1).room_id,
            round: 2,
        })
        .unwrap();

        assert_eq!(trigger.wait().await, Wake::Push);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_push_disabled_by_config() {
        let (_tx, rx) = broadcast::channel::<RoomChanged>(8);
        let cfg = SyncConfig {
            push: false,
            ..config()
        };
        let trigger = SyncTrigger::new(&cfg, view(1).room_id, Some(rx));
        assert!(!trigger.has_push());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_closed_push_falls_back_to_interval() {
        let (tx, rx) = broadcast::channel::<RoomChanged>(8);
        let mut trigger = SyncTrigger::new(&config(), view(1).room_id, Some(rx));
        drop(tx);

        assert_eq!(trigger.wait().await, Wake::Interval);
        assert!(!trigger.has_push());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_lagged_counts_as_push() {
        let (tx, rx) = broadcast::channel(1);
        let mut trigger = SyncTrigger::new(&config(), view(1).room_id, Some(rx));
        let other = RoomCode::parse("ZZZZZZ").unwrap();
        for round in 0..3 {
            tx.send(RoomChanged {
                room_id: other.clone(),
                round,
            })
            .unwrap();
        }

        assert_eq!(trigger.wait().await, Wake::Push);
    }
}
