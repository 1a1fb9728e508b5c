//! Global ball accounting.
//!
//! Every ball in the machine is in exactly one location: the trough, a
//! pending feed launch, in play, fed stealthily toward the holder, or held by
//! the device. Counts move optimistically when a command is issued, not when
//! the mechanism finishes, so a decision taken in the same event never sees a
//! stale count.
//!
//! `balls_requested()` is the single answer to "how many balls does the game
//! believe are in play".

mod accounts;
mod traits;
mod types;

pub use accounts::BallLedger;
pub use traits::FeedLauncher;
pub use types::{LaunchPlan, LaunchRequest, LedgerSnapshot};
