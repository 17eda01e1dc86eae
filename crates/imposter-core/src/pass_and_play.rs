//! Pass-and-Play Local Simulator.
//!
//! One device is handed around the table. Each seat goes through two
//! phases: a blind [`RevealPhase::Prompt`] ("pass the device to player N")
//! and, after an explicit tap, [`RevealPhase::Word`]. Advancing hides the
//! word again before the next seat's prompt, so at most one word is ever
//! visible.
//!
//! ```text
//! deal ──► Prompt(0) ─reveal─► Word(0) ─advance─► Prompt(1) ... Word(n-1) ─advance─► Finished
//! ```

use imposter_protocol::{Locale, PackId, Role};
use rand::Rng;

use crate::{Deal, DealError, WordPackRegistry, WordPair, clamp_imposters};

/// Smallest table pass-and-play accepts.
pub const PASS_MIN_PLAYERS: usize = 3;
/// Largest table pass-and-play accepts.
pub const PASS_MAX_PLAYERS: usize = 12;

/// What the setup screen collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSettings {
    pub total_players: usize,
    pub imposters: usize,
    pub pack_id: PackId,
    pub locale: Locale,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            total_players: 4,
            imposters: 1,
            pack_id: PackId::default(),
            locale: Locale::default(),
        }
    }
}

impl PassSettings {
    /// Clamps `total_players` to 3–12 and `imposters` below it.
    pub fn clamped(mut self) -> Self {
        self.total_players = self.total_players.clamp(PASS_MIN_PLAYERS, PASS_MAX_PLAYERS);
        self.imposters = clamp_imposters(self.imposters, self.total_players);
        self
    }
}

/// Sub-phase of the seat currently holding the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Hand-off screen; nothing secret is shown.
    Prompt,
    /// The seat's word is on screen.
    Word,
}

/// The one card that may be on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCard<'a> {
    pub seat: usize,
    pub role: Role,
    pub word: &'a str,
}

/// Result of [`PassRound::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The device moves to this seat, in the prompt phase.
    Next(usize),
    /// Every seat has seen its word.
    Finished,
}

/// A dealt pass-and-play round. Never leaves the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRound {
    settings: PassSettings,
    deal: Deal,
    current_index: usize,
    phase: RevealPhase,
}

impl PassRound {
    /// Clamps `settings` and deals a fresh round starting at seat 0.
    ///
    /// # Errors
    /// Fails only if the pack is unknown or has no pairs.
    pub fn deal<R: Rng + ?Sized>(
        settings: PassSettings,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<Self, DealError> {
        let settings = settings.clamped();
        let deal = Deal::new(
            registry,
            &settings.pack_id,
            &settings.locale,
            settings.total_players,
            settings.imposters,
            rng,
        )?;
        Ok(Self {
            settings,
            deal,
            current_index: 0,
            phase: RevealPhase::Prompt,
        })
    }

    /// A brand-new round with the same settings.
    pub fn redeal<R: Rng + ?Sized>(
        &self,
        registry: &WordPackRegistry,
        rng: &mut R,
    ) -> Result<Self, DealError> {
        Self::deal(self.settings.clone(), registry, rng)
    }

    /// Settings after clamping.
    pub fn settings(&self) -> &PassSettings {
        &self.settings
    }

    pub fn total_players(&self) -> usize {
        self.settings.total_players
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// `true` once the last seat has advanced.
    pub fn is_finished(&self) -> bool {
        self.current_index >= self.settings.total_players
    }

    /// Shows the current seat's word. Revealing twice is harmless.
    pub fn reveal(&mut self) -> Option<SeatCard<'_>> {
        if self.is_finished() {
            return None;
        }
        self.phase = RevealPhase::Word;
        self.visible()
    }

    /// The card on screen, if any. `None` during the prompt phase.
    pub fn visible(&self) -> Option<SeatCard<'_>> {
        if self.phase != RevealPhase::Word {
            return None;
        }
        self.deal
            .seat(self.current_index)
            .map(|(role, word)| SeatCard {
                seat: self.current_index,
                role,
                word,
            })
    }

    /// Hides the word and hands the device on.
    ///
    /// # Errors
    /// [`DealError::WordHidden`] if the current seat hasn't revealed yet.
    pub fn advance(&mut self) -> Result<Advance, DealError> {
        if self.is_finished() {
            return Ok(Advance::Finished);
        }
        if self.phase != RevealPhase::Word {
            return Err(DealError::WordHidden);
        }
        self.phase = RevealPhase::Prompt;
        self.current_index += 1;
        if self.is_finished() {
            Ok(Advance::Finished)
        } else {
            Ok(Advance::Next(self.current_index))
        }
    }

    /// The round's words, for the summary screen once everyone has played.
    pub fn pair(&self) -> Option<&WordPair> {
        self.is_finished().then_some(&self.deal.pair)
    }

    pub fn imposter_count(&self) -> usize {
        self.deal.imposter_count()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn round(total_players: usize, imposters: usize) -> PassRound {
        let settings = PassSettings {
            total_players,
            imposters,
            ..PassSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        PassRound::deal(settings, &WordPackRegistry::builtin(), &mut rng).unwrap()
    }

    #[test]
    fn test_six_seats_visited_in_order_then_finished() {
        let mut r = round(6, 1);
        let mut visited = vec![r.current_index()];

        loop {
            assert_eq!(r.phase(), RevealPhase::Prompt);
            assert!(r.visible().is_none());
            let seat = r.reveal().unwrap().seat;
            assert_eq!(seat, r.current_index());
            match r.advance().unwrap() {
                Advance::Next(i) => visited.push(i),
                Advance::Finished => break,
            }
        }

        assert_eq!(visited, vec![0, 1, 2, 3, 4, 5]);
        assert!(r.is_finished());
        assert!(r.reveal().is_none());
        assert_eq!(r.advance(), Ok(Advance::Finished));
    }

    #[test]
    fn test_imposters_clamped_below_total() {
        let r = round(4, 4);
        assert_eq!(r.settings().imposters, 3);
        assert_eq!(r.imposter_count(), 3);
    }

    #[test]
    fn test_total_players_clamped() {
        assert_eq!(round(1, 1).total_players(), PASS_MIN_PLAYERS);
        assert_eq!(round(40, 1).total_players(), PASS_MAX_PLAYERS);
    }

    #[test]
    fn test_advance_before_reveal_is_rejected() {
        let mut r = round(3, 1);
        assert_eq!(r.advance(), Err(DealError::WordHidden));
        assert_eq!(r.current_index(), 0);
    }

    #[test]
    fn test_advancing_hides_the_word() {
        let mut r = round(3, 1);
        r.reveal();
        assert!(r.visible().is_some());

        r.advance().unwrap();
        assert!(r.visible().is_none());
        assert_eq!(r.phase(), RevealPhase::Prompt);
    }

    #[test]
    fn test_pair_hidden_until_finished() {
        let mut r = round(3, 1);
        assert!(r.pair().is_none());
        for _ in 0..3 {
            r.reveal();
            r.advance().unwrap();
        }
        assert!(r.pair().is_some());
    }

    #[test]
    fn test_redeal_keeps_settings_and_restarts() {
        let mut r = round(5, 2);
        r.reveal();
        r.advance().unwrap();

        let mut rng = StdRng::seed_from_u64(77);
        let next = r.redeal(&WordPackRegistry::builtin(), &mut rng).unwrap();
        assert_eq!(next.settings(), r.settings());
        assert_eq!(next.current_index(), 0);
        assert_eq!(next.phase(), RevealPhase::Prompt);
    }
}
