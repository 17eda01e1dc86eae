//! Identity and vocabulary types shared by every layer.
//!
//! These are the small "nouns" of the protocol: who a player is, which room
//! they are in, which word pack a room uses, and which side of the game a
//! player is on. They all serialize as plain strings so the browser client
//! can use them without wrappers.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// An opaque identifier for a player, generated by the Room Service when the
/// player creates or joins a room.
///
/// Players are anonymous, so this id doubles as the player's credential for
/// `sync` and `nextRound`. `#[serde(transparent)]` keeps it a bare JSON
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Generates a random 32-character hex id (128 bits of entropy).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ids are long; the first 8 hex chars are plenty for logs.
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "P-{short}")
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short, human-typeable room identifier such as `K7QX2M`.
///
/// Codes are shared out loud and typed on phones, so parsing is forgiving
/// (surrounding whitespace and lowercase are accepted) but the stored form
/// is always uppercase ASCII letters and digits.
///
/// Deserialization goes through [`RoomCode::parse`], so a malformed code is
/// rejected at the codec instead of deep inside the room layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of generated codes.
    pub const LEN: usize = 6;

    /// Characters used for generated codes. `0`/`O`, `1`/`I` are left out
    /// so a code read aloud can't be mistyped.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Parses user or wire input into a room code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] unless the trimmed input is
    /// exactly [`Self::LEN`] ASCII letters or digits.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.len() != Self::LEN
            || !normalized.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Generates a random [`Self::LEN`]-character code from [`Self::ALPHABET`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.random_range(0..Self::ALPHABET.len());
                char::from(Self::ALPHABET[idx])
            })
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// PackId / Locale
// ---------------------------------------------------------------------------

/// Identifier of a word pack in the static catalog (e.g. `everyday`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(pub String);

impl PackId {
    /// The pack new rooms use unless the host picks another one.
    pub const DEFAULT: &'static str = "everyday";

    /// Creates a pack id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PackId {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A BCP-47-ish language tag sent with every request (`en`, `es-MX`).
///
/// The Room Service uses it to pick the word list of a pack; nothing else in
/// the protocol is localized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(pub String);

impl Locale {
    /// Fallback locale for packs that lack the requested language.
    pub const DEFAULT: &'static str = "en";

    /// Creates a locale from anything string-like.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The primary language subtag, lowercased: `es-MX` → `es`.
    pub fn language(&self) -> String {
        self.0
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which side of a round a player is on.
///
/// Serialized lowercase (`"crew"`, `"imposter"`) to match the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Holds the round's main (majority) word.
    Crew,
    /// Holds the related-but-different imposter word.
    Imposter,
}

impl Role {
    /// Returns `true` for [`Role::Imposter`].
    pub fn is_imposter(self) -> bool {
        matches!(self, Self::Imposter)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crew => write!(f, "crew"),
            Self::Imposter => write!(f, "imposter"),
        }
    }
}
