//! Room Session State Machine.
//!
//! [`ClientSession`] is one player's client: the current [`Step`], the
//! actions that move between steps, and the background sync that keeps a
//! joined room fresh.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Every networked action snapshots what it needs, releases the
//! lock, awaits the service, then re-locks and checks that the session
//! hasn't moved on (the `epoch` counter) before writing anything.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use imposter_core::{Advance, PassRound, WordPackRegistry, sanitize_name};
use imposter_protocol::{CreateRoom, JoinRoom, RoomCode, RoomRequest, RoomView};

use crate::in_flight::InFlight;
use crate::invite::invite_link;
use crate::step::{CreateForm, JoinForm, PassCard, PassSetupForm, RoomScreen};
use crate::sync::{RoomSync, SyncHandle, SyncTrigger, reconcile};
use crate::{Action, RoomService, ServiceError, SessionConfig, SessionError, Step, StepKind};

struct SessionState {
    step: Step,
    /// Bumped whenever the session leaves a room or the mode screen is
    /// re-entered; late responses from an older epoch are dropped.
    epoch: u64,
}

/// One player's client session.
pub struct ClientSession<S> {
    service: Arc<S>,
    config: SessionConfig,
    registry: WordPackRegistry,
    state: Arc<Mutex<SessionState>>,
    in_flight: InFlight,
    sync: Mutex<Option<SyncHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: RoomService> ClientSession<S> {
    /// A session on the mode screen, using the built-in word packs for
    /// pass-and-play.
    pub fn new(service: Arc<S>, config: SessionConfig) -> Self {
        Self::with_registry(service, config, WordPackRegistry::builtin())
    }

    pub fn with_registry(service: Arc<S>, config: SessionConfig, registry: WordPackRegistry) -> Self {
        Self {
            service,
            config,
            registry,
            state: Arc::new(Mutex::new(SessionState {
                step: Step::Mode,
                epoch: 0,
            })),
            in_flight: InFlight::new(),
            sync: Mutex::new(None),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// A snapshot of the current step.
    pub fn step(&self) -> Step {
        lock(&self.state).step.clone()
    }

    pub fn step_kind(&self) -> StepKind {
        lock(&self.state).step.kind()
    }

    /// The current room view, if in a networked room.
    pub fn room(&self) -> Option<RoomView> {
        lock(&self.state).step.room().cloned()
    }

    pub fn is_in_flight(&self, action: Action) -> bool {
        self.in_flight.is_busy(action)
    }

    /// Whether a background sync loop is running.
    pub fn is_syncing(&self) -> bool {
        lock(&self.sync)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Invite link for the current room.
    pub fn invite_link(&self, base_url: &str) -> Option<String> {
        lock(&self.state)
            .step
            .room()
            .map(|view| invite_link(base_url, &view.room_id))
    }

    // =========================================================================
    // Local transitions
    // =========================================================================

    /// Mode → Create.
    pub fn choose_host(&self) -> Result<(), SessionError> {
        self.transition("host", |step| match step {
            Step::Mode => Some(Step::Create(CreateForm::default())),
            _ => None,
        })
    }

    /// Mode → Join, optionally pre-filled from an invite link.
    pub fn choose_join(&self, prefill: Option<RoomCode>) -> Result<(), SessionError> {
        self.transition("join", |step| match step {
            Step::Mode => Some(Step::Join(JoinForm {
                room_code: prefill
                    .as_ref()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
                ..JoinForm::default()
            })),
            _ => None,
        })
    }

    /// Mode → PassSetup.
    pub fn choose_pass(&self) -> Result<(), SessionError> {
        self.transition("pass and play", |step| match step {
            Step::Mode => Some(Step::PassSetup(PassSetupForm::default())),
            _ => None,
        })
    }

    /// Create / Join / PassSetup → Mode. Rooms are left with
    /// [`leave_room`](Self::leave_room), pass rounds with
    /// [`exit_pass`](Self::exit_pass).
    pub fn back(&self) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match state.step.kind() {
            StepKind::Create | StepKind::Join | StepKind::PassSetup => {
                state.step = Step::Mode;
                state.epoch += 1;
                Ok(())
            }
            step => Err(SessionError::InvalidStep {
                action: "go back",
                step,
            }),
        }
    }

    pub fn edit_create(&self, edit: impl FnOnce(&mut CreateForm)) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match &mut state.step {
            Step::Create(form) => {
                edit(form);
                Ok(())
            }
            other => Err(SessionError::InvalidStep {
                action: "edit the create form",
                step: other.kind(),
            }),
        }
    }

    pub fn edit_join(&self, edit: impl FnOnce(&mut JoinForm)) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match &mut state.step {
            Step::Join(form) => {
                edit(form);
                Ok(())
            }
            other => Err(SessionError::InvalidStep {
                action: "edit the join form",
                step: other.kind(),
            }),
        }
    }

    pub fn edit_pass_setup(
        &self,
        edit: impl FnOnce(&mut PassSetupForm),
    ) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match &mut state.step {
            Step::PassSetup(form) => {
                edit(form);
                Ok(())
            }
            other => Err(SessionError::InvalidStep {
                action: "edit the pass-and-play setup",
                step: other.kind(),
            }),
        }
    }

    fn transition(
        &self,
        action: &'static str,
        next: impl FnOnce(&Step) -> Option<Step>,
    ) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match next(&state.step) {
            Some(step) => {
                state.step = step;
                Ok(())
            }
            None => Err(SessionError::InvalidStep {
                action,
                step: state.step.kind(),
            }),
        }
    }

    // =========================================================================
    // Networked actions
    // =========================================================================

    /// Submits the create form.
    ///
    /// Validation runs before any network call. On failure the session
    /// stays on the create form with the error recorded there.
    pub async fn submit_create(&self) -> Result<RoomView, SessionError> {
        let (epoch, req) = {
            let mut state = lock(&self.state);
            let (epoch, step) = (state.epoch, state.step.kind());
            let Step::Create(form) = &mut state.step else {
                return Err(SessionError::InvalidStep {
                    action: "create a room",
                    step,
                });
            };
            let Some(name) = sanitize_name(&form.name, self.config.max_name_len) else {
                form.error = Some(SessionError::MissingName.to_string());
                return Err(SessionError::MissingName);
            };
            let req = CreateRoom {
                locale: self.config.locale.clone(),
                name,
                pack_id: form.pack_id.clone(),
                imposters: form.imposters,
            };
            (epoch, req)
        };

        let _guard = self
            .in_flight
            .try_begin(Action::Create)
            .ok_or(SessionError::Busy(Action::Create))?;
        let result = self.service.create(req).await;
        self.enter_room(epoch, StepKind::Create, result)
    }

    /// Submits the join form. Same error contract as
    /// [`submit_create`](Self::submit_create).
    pub async fn submit_join(&self) -> Result<RoomView, SessionError> {
        let (epoch, req) = {
            let mut state = lock(&self.state);
            let (epoch, step) = (state.epoch, state.step.kind());
            let Step::Join(form) = &mut state.step else {
                return Err(SessionError::InvalidStep {
                    action: "join a room",
                    step,
                });
            };
            match self.validate_join(form) {
                Ok(req) => (epoch, req),
                Err(e) => {
                    form.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        let _guard = self
            .in_flight
            .try_begin(Action::Join)
            .ok_or(SessionError::Busy(Action::Join))?;
        let result = self.service.join(req).await;
        self.enter_room(epoch, StepKind::Join, result)
    }

    fn validate_join(&self, form: &JoinForm) -> Result<JoinRoom, SessionError> {
        if form.room_code.trim().is_empty() {
            return Err(SessionError::MissingRoomCode);
        }
        let room_id = RoomCode::parse(&form.room_code)
            .map_err(|_| SessionError::InvalidRoomCode(form.room_code.trim().to_string()))?;
        let name =
            sanitize_name(&form.name, self.config.max_name_len).ok_or(SessionError::MissingName)?;
        Ok(JoinRoom {
            locale: self.config.locale.clone(),
            room_id,
            name,
        })
    }

    /// Applies a create/join result submitted from `from` during `epoch`.
    fn enter_room(
        &self,
        epoch: u64,
        from: StepKind,
        result: Result<RoomView, ServiceError>,
    ) -> Result<RoomView, SessionError> {
        let mut state = lock(&self.state);
        let current = state.epoch == epoch && state.step.kind() == from;

        let view = match result {
            Ok(view) if current => view,
            Ok(view) => {
                // The user walked away mid-request; give the seat back.
                drop(state);
                tracing::debug!(room_id = %view.room_id, "discarding room entered after navigation");
                self.leave_in_background(RoomRequest::for_view(self.config.locale.clone(), &view));
                return Err(SessionError::Superseded);
            }
            Err(e) => {
                if current {
                    match &mut state.step {
                        Step::Create(form) => form.error = Some(e.to_string()),
                        Step::Join(form) => form.error = Some(e.to_string()),
                        _ => {}
                    }
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            room_id = %view.room_id,
            player_id = %view.player_id,
            round = view.round,
            is_host = view.is_host,
            "entered room"
        );
        state.step = Step::Room(RoomScreen {
            view: view.clone(),
            error: None,
        });
        let epoch = state.epoch;
        drop(state);

        self.start_sync(epoch, &view);
        Ok(view)
    }

    /// Host only: asks the service for a new deal.
    ///
    /// On success the room view is replaced by the service's answer. On
    /// failure the view is untouched and the error is shown on the room
    /// screen.
    pub async fn next_round(&self) -> Result<RoomView, SessionError> {
        let (epoch, req) = {
            let state = lock(&self.state);
            let Step::Room(screen) = &state.step else {
                return Err(SessionError::InvalidStep {
                    action: "start the next round",
                    step: state.step.kind(),
                });
            };
            if !screen.view.is_host {
                return Err(SessionError::NotHost);
            }
            (
                state.epoch,
                RoomRequest::for_view(self.config.locale.clone(), &screen.view),
            )
        };

        let _guard = self
            .in_flight
            .try_begin(Action::NextRound)
            .ok_or(SessionError::Busy(Action::NextRound))?;
        let result = self.service.next_round(req.clone()).await;

        let mut state = lock(&self.state);
        if state.epoch != epoch {
            return Err(SessionError::Superseded);
        }
        let Step::Room(screen) = &mut state.step else {
            return Err(SessionError::Superseded);
        };
        match result {
            Ok(view) => {
                tracing::info!(room_id = %view.room_id, round = view.round, "next round dealt");
                reconcile(&mut screen.view, view);
                screen.error = None;
                Ok(screen.view.clone())
            }
            Err(e) => {
                screen.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// One silent sync, outside the background schedule.
    ///
    /// Returns whether the local view changed. Errors are swallowed like a
    /// background sync's.
    pub async fn sync_now(&self) -> bool {
        let Some((epoch, req)) = ({
            let state = lock(&self.state);
            state
                .step
                .room()
                .map(|view| (state.epoch, RoomRequest::for_view(self.config.locale.clone(), view)))
        }) else {
            return false;
        };

        match self.service.sync(req).await {
            Ok(view) => apply_synced(&self.state, epoch, view),
            Err(e) => {
                tracing::debug!(error = %e, "sync failed");
                false
            }
        }
    }

    /// Leaves the room (or any other step) and returns to the mode screen.
    ///
    /// Purely local: state is reset and sync stopped before this returns.
    /// The service is told in the background and its answer is ignored.
    pub fn leave_room(&self) {
        let left = {
            let mut state = lock(&self.state);
            state.epoch += 1;
            let previous = std::mem::take(&mut state.step);
            match previous {
                Step::Room(screen) => Some(screen.view),
                _ => None,
            }
        };
        self.stop_sync();

        if let Some(view) = left {
            tracing::info!(room_id = %view.room_id, player_id = %view.player_id, "left room");
            self.leave_in_background(RoomRequest::for_view(self.config.locale.clone(), &view));
        }
    }

    fn leave_in_background(&self, req: RoomRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(room_id = %req.room_id, "no runtime; skipping server leave");
            return;
        };
        let service = Arc::clone(&self.service);
        runtime.spawn(async move {
            if let Err(e) = service.leave(req).await {
                tracing::debug!(error = %e, "best-effort leave failed");
            }
        });
    }

    // =========================================================================
    // Sync
    // =========================================================================

    fn start_sync(&self, epoch: u64, view: &RoomView) {
        let push = if self.config.sync.push {
            self.service.notifications()
        } else {
            None
        };
        let trigger = SyncTrigger::new(&self.config.sync, view.room_id.clone(), push);
        let request = RoomRequest::for_view(self.config.locale.clone(), view);
        let state = Arc::clone(&self.state);

        let handle = RoomSync::spawn(Arc::clone(&self.service), request, trigger, move |incoming| {
            apply_synced(&state, epoch, incoming);
        });
        // Replacing drops (and stops) any previous loop.
        *lock(&self.sync) = Some(handle);
    }

    fn stop_sync(&self) {
        lock(&self.sync).take();
    }

    // =========================================================================
    // Pass-and-play
    // =========================================================================

    /// PassSetup → PassReveal: deals with the setup form's settings.
    pub fn start_pass_round(&self) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        let step = state.step.kind();
        let Step::PassSetup(form) = &mut state.step else {
            return Err(SessionError::InvalidStep {
                action: "start a pass-and-play round",
                step,
            });
        };
        match PassRound::deal(form.settings.clone(), &self.registry, &mut rand::rng()) {
            Ok(round) => {
                tracing::debug!(
                    players = round.total_players(),
                    imposters = round.settings().imposters,
                    "pass-and-play round dealt"
                );
                state.step = Step::PassReveal(round);
                Ok(())
            }
            Err(e) => {
                form.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Shows the current seat's word. Only ever after an explicit call.
    pub fn reveal_word(&self) -> Result<PassCard, SessionError> {
        let mut state = lock(&self.state);
        let step = state.step.kind();
        let Step::PassReveal(round) = &mut state.step else {
            return Err(SessionError::InvalidStep {
                action: "reveal a word",
                step,
            });
        };
        round
            .reveal()
            .map(|card| PassCard {
                seat: card.seat,
                role: card.role,
                word: card.word.to_string(),
            })
            .ok_or(SessionError::InvalidStep {
                action: "reveal a word",
                step: StepKind::PassSummary,
            })
    }

    /// Hides the word and passes the device on; after the last seat the
    /// session moves to the summary.
    pub fn advance_seat(&self) -> Result<Advance, SessionError> {
        let mut state = lock(&self.state);
        let step = state.step.kind();
        let Step::PassReveal(round) = &mut state.step else {
            return Err(SessionError::InvalidStep {
                action: "pass the device",
                step,
            });
        };
        let advance = round.advance()?;
        if advance == Advance::Finished {
            if let Step::PassReveal(round) = std::mem::take(&mut state.step) {
                state.step = Step::PassSummary(round);
            }
        }
        Ok(advance)
    }

    /// PassSummary → PassReveal with a fresh deal and the same settings.
    pub fn restart_pass_round(&self) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        let step = state.step.kind();
        let Step::PassSummary(round) = &state.step else {
            return Err(SessionError::InvalidStep {
                action: "start a new round",
                step,
            });
        };
        let next = round.redeal(&self.registry, &mut rand::rng())?;
        state.step = Step::PassReveal(next);
        Ok(())
    }

    /// Any pass-and-play step → Mode. The round is discarded.
    pub fn exit_pass(&self) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        match state.step.kind() {
            StepKind::PassSetup | StepKind::PassReveal | StepKind::PassSummary => {
                state.step = Step::Mode;
                state.epoch += 1;
                Ok(())
            }
            step => Err(SessionError::InvalidStep {
                action: "exit pass and play",
                step,
            }),
        }
    }
}

/// Writes a synced view if the session is still in the same room and epoch.
fn apply_synced(state: &Mutex<SessionState>, epoch: u64, incoming: RoomView) -> bool {
    let mut state = lock(state);
    if state.epoch != epoch {
        return false;
    }
    match &mut state.step {
        Step::Room(screen)
            if screen.view.room_id == incoming.room_id
                && screen.view.player_id == incoming.player_id =>
        {
            reconcile(&mut screen.view, incoming)
        }
        _ => false,
    }
}

impl<S> Drop for ClientSession<S> {
    fn drop(&mut self) {
        // The sync loop holds its own Arc to the state; stop it explicitly.
        lock(&self.sync).take();
    }
}
