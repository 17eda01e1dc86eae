//! Error types for dealing rounds.

use imposter_protocol::PackId;

/// Errors raised while building a deal or stepping through a reveal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    /// A round needs a non-imposter majority able to discuss.
    #[error("at least {min} players are needed, got {players}")]
    NotEnoughPlayers { players: usize, min: usize },

    /// `imposters` must satisfy `1 <= imposters < players`.
    #[error("{imposters} imposters is invalid for {players} players")]
    InvalidImposterCount { imposters: usize, players: usize },

    /// The pack id is not in the registry.
    #[error("unknown word pack {0}")]
    UnknownPack(PackId),

    /// The pack exists but has no word pairs to draw from.
    #[error("word pack {0} has no word pairs")]
    EmptyPack(PackId),

    /// Pass-and-play: tried to move on before the seat saw its word.
    #[error("the current seat has not revealed its word yet")]
    WordHidden,
}
