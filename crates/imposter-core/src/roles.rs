//! Role Assignment Engine.
//!
//! A deal is two independent draws: a uniform permutation of seats (who is
//! an imposter) and a uniform pick of one word pair from the pack. Nothing
//! here balances seats socially; imposters may well sit next to each other.

use imposter_protocol::{Locale, PackId, Role};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{DealError, WordPackRegistry, WordPair};

/// Fewest players a round can be dealt to.
pub const MIN_PLAYERS: usize = 3;

/// Clamps a requested imposter count so at least one crew member remains.
///
/// The result is always at least 1, so callers with fewer than two players
/// still get a value that [`assign_roles`] will reject with a clear error.
pub fn clamp_imposters(requested: usize, players: usize) -> usize {
    requested.min(players.saturating_sub(1)).max(1)
}

/// Produces a shuffled role vector with exactly `imposters` imposters.
///
/// The first `imposters` slots start as [`Role::Imposter`], then the whole
/// vector is shuffled (Fisher–Yates), so every seat permutation is
/// reachable.
///
/// # Errors
/// - [`DealError::NotEnoughPlayers`] if `players < MIN_PLAYERS`
/// - [`DealError::InvalidImposterCount`] unless `1 <= imposters < players`
pub fn assign_roles<R: Rng + ?Sized>(
    players: usize,
    imposters: usize,
    rng: &mut R,
) -> Result<Vec<Role>, DealError> {
    if players < MIN_PLAYERS {
        return Err(DealError::NotEnoughPlayers {
            players,
            min: MIN_PLAYERS,
        });
    }
    if imposters == 0 || imposters >= players {
        return Err(DealError::InvalidImposterCount { imposters, players });
    }

    let mut roles: Vec<Role> = (0..players)
        .map(|seat| if seat < imposters { Role::Imposter } else { Role::Crew })
        .collect();
    roles.shuffle(rng);
    Ok(roles)
}

/// One fully dealt round: a role per seat and the pair the words come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    /// Index = seat (join order for rooms, device order for pass-and-play).
    pub roles: Vec<Role>,
    pub pair: WordPair,
}

impl Deal {
    /// Runs the engine once: clamps nothing, validates everything.
    ///
    /// Callers clamp `imposters` with [`clamp_imposters`] first.
    pub fn new<R: Rng + ?Sized>(
        registry: &WordPackRegistry,
        pack: &PackId,
        locale: &Locale,
        players: usize,
        imposters: usize,
        rng: &mut R,
    ) -> Result<Self, DealError> {
        let roles = assign_roles(players, imposters, rng)?;
        let pair = registry.pick_pair(pack, locale, rng)?;
        tracing::debug!(%pack, players, imposters, "round dealt");
        Ok(Self { roles, pair })
    }

    /// The word a player with `role` receives.
    pub fn word_for(&self, role: Role) -> &str {
        match role {
            Role::Crew => &self.pair.main,
            Role::Imposter => &self.pair.imposter,
        }
    }

    /// Role and word of one seat.
    pub fn seat(&self, index: usize) -> Option<(Role, &str)> {
        self.roles
            .get(index)
            .map(|&role| (role, self.word_for(role)))
    }

    pub fn imposter_count(&self) -> usize {
        self.roles.iter().filter(|r| r.is_imposter()).count()
    }
}
