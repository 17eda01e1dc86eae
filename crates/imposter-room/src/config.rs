//! Room configuration and lifecycle.

use std::time::Duration;

use imposter_core::MIN_PLAYERS;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Limits applied to every room a directory hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Players needed before round 1 is dealt and for every `nextRound`.
    pub min_players: usize,

    /// Joins beyond this are refused with `RoomFull`.
    pub max_players: usize,

    /// Display names are cut to this many characters.
    pub max_name_len: usize,

    /// Rooms untouched for longer than this are evicted by the sweep.
    pub idle_ttl: Duration,
}

impl RoomConfig {
    /// Raises `min_players` to the dealing minimum and keeps
    /// `max_players >= min_players`.
    pub fn normalized(mut self) -> Self {
        self.min_players = self.min_players.max(MIN_PLAYERS);
        self.max_players = self.max_players.max(self.min_players);
        self.max_name_len = self.max_name_len.max(1);
        self
    }

    /// Largest imposter count a room may ask for.
    pub fn max_imposters(&self) -> usize {
        self.max_players.saturating_sub(1).max(1)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: 12,
            max_name_len: 24,
            idle_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its life.
///
/// ```text
/// WaitingForPlayers → Playing → Closed
/// ```
///
/// - **WaitingForPlayers**: fewer than `min_players` have ever been
///   present; round 1 is not dealt yet.
/// - **Playing**: at least one round has been dealt. The room stays here
///   even if players drop below the minimum.
/// - **Closed**: the last player left or the room was evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    WaitingForPlayers,
    Playing,
    Closed,
}

impl RoomPhase {
    /// Returns `true` once round 1 has been dealt.
    pub fn is_dealt(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::WaitingForPlayers => Some(Self::Playing),
            Self::Playing => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// A room may close from any open phase; otherwise phases only move
    /// forward one step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (target == Self::Closed && self != Self::Closed)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::Playing => write!(f, "Playing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_phase_next_follows_order() {
        assert_eq!(RoomPhase::WaitingForPlayers.next(), Some(RoomPhase::Playing));
        assert_eq!(RoomPhase::Playing.next(), Some(RoomPhase::Closed));
        assert_eq!(RoomPhase::Closed.next(), None);
    }

    #[test]
    fn test_room_phase_can_transition_to() {
        assert!(RoomPhase::WaitingForPlayers.can_transition_to(RoomPhase::Playing));
        assert!(RoomPhase::WaitingForPlayers.can_transition_to(RoomPhase::Closed));
        assert!(!RoomPhase::Playing.can_transition_to(RoomPhase::WaitingForPlayers));
        assert!(!RoomPhase::Closed.can_transition_to(RoomPhase::Closed));
    }

    #[test]
    fn test_room_phase_display() {
        assert_eq!(RoomPhase::WaitingForPlayers.to_string(), "WaitingForPlayers");
        assert_eq!(RoomPhase::Playing.to_string(), "Playing");
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 12);
        assert_eq!(config.max_name_len, 24);
        assert_eq!(config.idle_ttl, Duration::from_secs(7200));
        assert_eq!(config.max_imposters(), 11);
    }

    #[test]
    fn test_room_config_normalized() {
        let config = RoomConfig {
            min_players: 1,
            max_players: 2,
            max_name_len: 0,
            ..RoomConfig::default()
        }
        .normalized();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 3);
        assert_eq!(config.max_name_len, 1);
    }
}
