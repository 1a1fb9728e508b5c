//! Types for the multiball rules.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::player::{PlayerStore, PlayerStoreError};

use super::config::MultiballConfig;

/// Player store key for [`LockOwnership`].
pub const LOCK_OWNERSHIP_KEY: &str = "lock_ownership";

/// Per-player lock progress, carried between that player's turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwnership {
    /// Locks this player is credited with (0..=locks_for_multiball).
    pub balls_locked: u32,
    /// Locks currently lit for this player.
    pub locks_lit: u32,
    /// Whether this player has started a multiball this game.
    pub multiball_played: bool,
    /// Credited locks since the last award.
    #[serde(default)]
    pub award_progress: u32,
}

impl LockOwnership {
    /// Load the record for `player`, or a fresh one if none was stored.
    pub fn load(store: &dyn PlayerStore, player: usize) -> Result<Self, PlayerStoreError> {
        match store.get(player, LOCK_OWNERSHIP_KEY)? {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| PlayerStoreError::Deserialize {
                    player,
                    key: LOCK_OWNERSHIP_KEY.to_string(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    pub fn store(&self, store: &dyn PlayerStore, player: usize) -> Result<(), PlayerStoreError> {
        let value = serde_json::to_value(self).map_err(|source| PlayerStoreError::Serialize {
            player,
            key: LOCK_OWNERSHIP_KEY.to_string(),
            source,
        })?;
        store.set(player, LOCK_OWNERSHIP_KEY, value)
    }

    /// A lit lock is waiting to be collected.
    pub fn lock_available(&self) -> bool {
        self.balls_locked < self.locks_lit
    }
}

/// Physical locks held by the device versus the locks a player is credited
/// with, taken when the player's turn begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualLockDeficit {
    pub physical: u32,
    pub credited: u32,
}

impl VirtualLockDeficit {
    pub fn compute(physical: u32, credited: u32) -> Self {
        Self { physical, credited }
    }

    /// Signed difference: positive when the device holds balls someone else
    /// locked, negative when this player's balls were released meanwhile.
    pub fn raw(&self) -> i64 {
        self.physical as i64 - self.credited as i64
    }

    /// The deficit after capping the player's credit to physical reality.
    /// Never negative.
    pub fn reconciled(&self) -> u32 {
        self.physical.saturating_sub(self.credited)
    }

    /// Locks the player was credited with that the holder no longer has.
    pub fn lost_credit(&self) -> u32 {
        self.credited.saturating_sub(self.physical)
    }

    /// Credit the player keeps.
    pub fn capped_credit(&self) -> u32 {
        self.credited.min(self.physical)
    }

    pub fn is_capped(&self) -> bool {
        self.credited > self.physical
    }
}

/// Where the lock/multiball cycle is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiballPhase {
    /// Collecting locks.
    #[default]
    Load,
    /// Balls released, jackpot shots active.
    Multiball,
}

/// Jackpot progress for the current ball.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackpotState {
    pub lit: bool,
    /// Ramp shots made toward relighting.
    pub shots_made: u32,
    /// Ramp shots needed to relight. Only ever grows within a ball.
    pub shots_required: u32,
    /// Jackpots collected this ball.
    pub collected: u32,
}

impl JackpotState {
    pub fn new(config: &MultiballConfig) -> Self {
        Self {
            lit: false,
            shots_made: 0,
            shots_required: config.jackpot_relight_shots,
            collected: 0,
        }
    }
}

/// Multiball rule notifications for the mode-sequencing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    LocksLit {
        player: usize,
        locks_lit: u32,
    },
    LockCollected {
        player: usize,
        balls_locked: u32,
        virtual_lock: bool,
    },
    /// A ball was captured with the gate disarmed and is on its way back out.
    SneakyLock {
        player: usize,
        award_progress: u32,
    },
    MultiballStarted {
        player: usize,
        balls: u32,
    },
    MultiballEnded {
        player: usize,
        jackpots: u32,
    },
    JackpotLit {
        player: usize,
        shots_required: u32,
    },
    JackpotCollected {
        player: usize,
        value: u64,
        collected: u32,
    },
    AwardEarned {
        player: usize,
    },
    /// A shot paid off one lock owed after a capped credit. The gate
    /// re-arms once `remaining` reaches zero.
    LockPaydown {
        player: usize,
        remaining: u32,
    },
    BallEnded {
        player: usize,
    },
}

/// Callback receiving every [`Notification`] as it happens.
pub type NotificationCallback = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Snapshot of the rule state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiballStatus {
    pub player: Option<usize>,
    pub phase: MultiballPhase,
    pub ownership: LockOwnership,
    pub jackpot: JackpotState,
    /// Lock-lane shots that will still be credited without a capture.
    pub virtual_credits: u32,
    /// Shots owed before the gate re-arms.
    pub lock_paydown: u32,
    pub multiballs_completed: u32,
}
