//! Player-scoped key/value storage.
//!
//! Game rules persist typed per-player records here between turns. Values
//! are JSON so each rule layer owns its own record shape.

mod memory;
mod traits;

pub use memory::MemoryPlayerStore;
pub use traits::{PlayerStore, PlayerStoreError};
