//! The state of one room, with every membership and dealing rule.
//!
//! [`RoomRecord`] is plain data plus methods: no channels, no clock. The
//! room actor owns one and serializes access to it; tests drive it directly
//! with a seeded RNG.

use imposter_core::{Deal, WordPackRegistry, clamp_imposters, same_name, sanitize_name};
use imposter_protocol::{
    CreateRoom, Locale, PackId, PlayerId, PlayerSummary, Role, RoomCode, RoomView,
};
use rand::Rng;

use crate::{RoomConfig, RoomError, RoomPhase};

/// One seat in a room.
#[derive(Debug, Clone)]
struct Seat {
    id: PlayerId,
    name: String,
    /// `None` until the player is dealt into a round.
    hand: Option<(Role, String)>,
}

/// What a successful leave did to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player left; nothing else changed.
    Left,
    /// The host left and the seat passed to another player.
    HostTransferred(PlayerId),
    /// The last player left. The room should be destroyed.
    Empty,
}

/// Authoritative state of a room.
#[derive(Debug, Clone)]
pub struct RoomRecord {
    room_id: RoomCode,
    pack_id: PackId,
    /// Language words are drawn in; follows whoever last dealt.
    locale: Locale,
    imposters: usize,
    round: u32,
    phase: RoomPhase,
    /// Join order. The host is always one of these.
    seats: Vec<Seat>,
    host: PlayerId,
    config: RoomConfig,
}

impl RoomRecord {
    /// Creates a room with the requester as host and sole member.
    ///
    /// The imposter count is clamped to `1..=max_players-1`; the pack must
    /// exist in `registry`.
    pub fn create<R: Rng + ?Sized>(
        room_id: RoomCode,
        req: &CreateRoom,
        config: RoomConfig,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<(Self, PlayerId), RoomError> {
        let name = sanitize_name(&req.name, config.max_name_len).ok_or(RoomError::InvalidName)?;
        if !registry.contains(&req.pack_id) {
            return Err(RoomError::UnknownPack(req.pack_id.clone()));
        }

        let host = PlayerId::random(rng);
        let record = Self {
            room_id,
            pack_id: req.pack_id.clone(),
            locale: req.locale.clone(),
            imposters: req.imposters.clamp(1, config.max_imposters()),
            round: 1,
            phase: RoomPhase::WaitingForPlayers,
            seats: vec![Seat {
                id: host.clone(),
                name,
                hand: None,
            }],
            host: host.clone(),
            config,
        };
        Ok((record, host))
    }

    /// Adds a player. Deals round 1 if this join brings the room to
    /// `min_players` for the first time.
    ///
    /// # Errors
    /// `InvalidName`, `RoomFull` or `NameTaken`. A failed deal is logged
    /// and leaves the room waiting; the join itself still succeeds.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        raw_name: &str,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<PlayerId, RoomError> {
        let name =
            sanitize_name(raw_name, self.config.max_name_len).ok_or(RoomError::InvalidName)?;
        if self.seats.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }
        if self.seats.iter().any(|s| same_name(&s.name, &name)) {
            return Err(RoomError::NameTaken(name));
        }

        let id = self.fresh_player_id(rng);
        self.seats.push(Seat {
            id: id.clone(),
            name,
            hand: None,
        });

        if self.phase == RoomPhase::WaitingForPlayers && self.seats.len() >= self.config.min_players
        {
            match self.deal(registry, rng) {
                Ok(()) => self.enter(RoomPhase::Playing),
                Err(e) => tracing::warn!(room_id = %self.room_id, error = %e, "first deal failed"),
            }
        }
        Ok(id)
    }

    /// Deals a new round. Host only, and only with `min_players` present.
    ///
    /// On error the room is unchanged.
    pub fn next_round<R: Rng + ?Sized>(
        &mut self,
        caller: &PlayerId,
        locale: &Locale,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        self.seat_index(caller)?;
        if *caller != self.host {
            return Err(RoomError::NotHost);
        }
        let players = self.seats.len();
        if players < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                players,
                min: self.config.min_players,
            });
        }

        let previous = std::mem::replace(&mut self.locale, locale.clone());
        if let Err(e) = self.deal(registry, rng) {
            self.locale = previous;
            return Err(e);
        }
        if self.phase.is_dealt() {
            self.round += 1;
        } else {
            self.enter(RoomPhase::Playing);
        }
        Ok(())
    }

    /// Removes a player, passing the host seat on if needed.
    pub fn leave(&mut self, player: &PlayerId) -> Result<LeaveOutcome, RoomError> {
        let index = self.seat_index(player)?;
        self.seats.remove(index);

        let Some(first) = self.seats.first() else {
            self.enter(RoomPhase::Closed);
            return Ok(LeaveOutcome::Empty);
        };
        if *player == self.host {
            self.host = first.id.clone();
            return Ok(LeaveOutcome::HostTransferred(self.host.clone()));
        }
        Ok(LeaveOutcome::Left)
    }

    /// The room as `player` may see it: their own role and word, everyone
    /// else's name only.
    pub fn view(&self, player: &PlayerId) -> Result<RoomView, RoomError> {
        let seat = &self.seats[self.seat_index(player)?];
        let (role, word) = match &seat.hand {
            Some((role, word)) => (Some(*role), Some(word.clone())),
            None => (None, None),
        };
        Ok(RoomView {
            room_id: self.room_id.clone(),
            player_id: seat.id.clone(),
            name: seat.name.clone(),
            is_host: seat.id == self.host,
            round: self.round,
            role,
            word,
            pack_id: self.pack_id.clone(),
            imposters: self.imposters,
            players: self
                .seats
                .iter()
                .map(|s| PlayerSummary {
                    name: s.name.clone(),
                    is_host: s.id == self.host,
                })
                .collect(),
        })
    }

    pub fn room_id(&self) -> &RoomCode {
        &self.room_id
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn max_players(&self) -> usize {
        self.config.max_players
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    // -- internals ----------------------------------------------------------

    /// Moves to `phase` if the lifecycle allows it; a closed room stays
    /// closed.
    fn enter(&mut self, phase: RoomPhase) {
        if !self.phase.can_transition_to(phase) {
            tracing::warn!(
                room_id = %self.room_id,
                from = %self.phase,
                to = %phase,
                "ignored phase change"
            );
            return;
        }
        tracing::debug!(
            room_id = %self.room_id,
            from = %self.phase,
            to = %phase,
            "room phase changed"
        );
        self.phase = phase;
    }

    fn seat_index(&self, player: &PlayerId) -> Result<usize, RoomError> {
        self.seats
            .iter()
            .position(|s| s.id == *player)
            .ok_or_else(|| RoomError::PlayerNotFound(player.clone(), self.room_id.clone()))
    }

    fn fresh_player_id<R: Rng + ?Sized>(&self, rng: &mut R) -> PlayerId {
        loop {
            let id = PlayerId::random(rng);
            if self.seats.iter().all(|s| s.id != id) {
                return id;
            }
        }
    }

    /// Deals every current seat in. All-or-nothing.
    fn deal<R: Rng + ?Sized>(
        &mut self,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        let players = self.seats.len();
        let imposters = clamp_imposters(self.imposters, players);
        let deal = Deal::new(registry, &self.pack_id, &self.locale, players, imposters, rng)?;

        for (seat, role) in self.seats.iter_mut().zip(&deal.roles) {
            seat.hand = Some((*role, deal.word_for(*role).to_string()));
        }
        tracing::debug!(
            room_id = %self.room_id,
            round = self.round,
            players,
            imposters,
            "room dealt"
        );
        Ok(())
    }
}
