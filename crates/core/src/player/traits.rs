//! Trait definitions for player storage.

use thiserror::Error;

/// Errors from reading or writing a typed player record.
#[derive(Debug, Error)]
pub enum PlayerStoreError {
    #[error("failed to serialize {key} for player {player}: {source}")]
    Serialize {
        player: usize,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize {key} for player {player}: {source}")]
    Deserialize {
        player: usize,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("player store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage scoped to one player.
pub trait PlayerStore: Send + Sync {
    fn get(&self, player: usize, key: &str) -> Result<Option<serde_json::Value>, PlayerStoreError>;

    fn set(&self, player: usize, key: &str, value: serde_json::Value)
        -> Result<(), PlayerStoreError>;

    /// Drop every player's records (new game).
    fn clear(&self) -> Result<(), PlayerStoreError>;
}
