//! In-memory player store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::{PlayerStore, PlayerStoreError};

/// Player store backed by a map; lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPlayerStore {
    values: Mutex<HashMap<(usize, String), serde_json::Value>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn get(&self, player: usize, key: &str) -> Result<Option<serde_json::Value>, PlayerStoreError> {
        let values = self
            .values
            .lock()
            .map_err(|e| PlayerStoreError::Unavailable(e.to_string()))?;
        Ok(values.get(&(player, key.to_string())).cloned())
    }

    fn set(
        &self,
        player: usize,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), PlayerStoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| PlayerStoreError::Unavailable(e.to_string()))?;
        values.insert((player, key.to_string()), value);
        Ok(())
    }

    fn clear(&self) -> Result<(), PlayerStoreError> {
        self.values
            .lock()
            .map_err(|e| PlayerStoreError::Unavailable(e.to_string()))?
            .clear();
        Ok(())
    }
}
