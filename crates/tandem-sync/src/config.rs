//! Timeouts for remote round-trips.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a [`RemoteGameController`](crate::remote::RemoteGameController)
/// waits for the other peer.
///
/// Stored in milliseconds so config files stay plain integers.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tandem_sync::SyncConfig;
///
/// let config: SyncConfig = serde_json::from_str(r#"{"append_timeout_ms": 250}"#).unwrap();
/// assert_eq!(config.append_timeout(), Duration::from_millis(250));
/// assert_eq!(config.create_timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Wait for `ChainCreated` after asking the peer to open a chain.
    pub create_timeout_ms: u64,
    /// Wait for `FollowUps` after appending an interaction.
    pub append_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            create_timeout_ms: 5000,
            append_timeout_ms: 3000,
        }
    }
}

impl SyncConfig {
    /// Both timeouts set to `timeout`. Handy for tests.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        Self {
            create_timeout_ms: ms,
            append_timeout_ms: ms,
        }
    }

    /// Wait for a chain to be created.
    #[must_use]
    pub const fn create_timeout(&self) -> Duration {
        Duration::from_millis(self.create_timeout_ms)
    }

    /// Wait for an append to be answered.
    #[must_use]
    pub const fn append_timeout(&self) -> Duration {
        Duration::from_millis(self.append_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.create_timeout(), Duration::from_secs(5));
        assert_eq!(config.append_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn uniform_timeout() {
        let config = SyncConfig::with_timeout(Duration::from_millis(40));
        assert_eq!(config.create_timeout_ms, 40);
        assert_eq!(config.append_timeout_ms, 40);
    }
}
