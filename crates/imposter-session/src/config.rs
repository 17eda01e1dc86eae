//! Client-side settings.

use std::time::Duration;

use imposter_protocol::Locale;

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// How often and on what the background room sync fires.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Poll period. Default: 3 seconds.
    pub interval: Duration,
    /// Upper bound of a random delay added before the first poll, so many
    /// clients that joined together don't poll in lockstep. Default: 500 ms.
    pub initial_jitter: Duration,
    /// Also wake on the service's push notices when it offers them.
    /// Default: `true`.
    pub push: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            initial_jitter: Duration::from_millis(500),
            push: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for one [`ClientSession`](crate::ClientSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sent with every request; picks the word list. Default: `en`.
    pub locale: Locale,
    /// Longest name the forms accept before sending. Default: 24.
    pub max_name_len: usize,
    pub sync: SyncConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            max_name_len: 24,
            sync: SyncConfig::default(),
        }
    }
}
