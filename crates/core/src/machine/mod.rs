//! The assembled subsystem.
//!
//! `Machine` owns the device, the ledger, the multiball rules and the timer
//! queue, and is the single entry point for switch events, elapsed time and
//! game control. It is synchronous and single-threaded: hosts feed it events
//! one at a time and never block on the mechanism.

mod dispatch;
mod types;

pub use dispatch::{Machine, MAX_PLAYERS};
pub use types::{GameStatus, MachineError, MachineSnapshot};
