//! Multiball lock/jackpot rules.
//!
//! `Load` collects locks, `Multiball` releases them and runs jackpot shots,
//! then back to `Load`. Lock credit belongs to a player and is carried
//! between turns in the player store, while the balls themselves sit in the
//! shared holder; [`VirtualLockDeficit`] reconciles the two whenever a turn
//! begins.

mod config;
mod context;
mod coordinator;
mod types;

pub use config::MultiballConfig;
pub use context::RulesContext;
pub use coordinator::MultiballCoordinator;
pub use types::{
    JackpotState, LockOwnership, MultiballPhase, MultiballStatus, Notification,
    NotificationCallback, VirtualLockDeficit, LOCK_OWNERSHIP_KEY,
};
