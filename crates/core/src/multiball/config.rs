//! Multiball rule configuration.

use serde::{Deserialize, Serialize};

/// Configuration for locks, multiball and jackpots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiballConfig {
    /// Locks needed to start multiball.
    #[serde(default = "default_locks_for_multiball")]
    pub locks_for_multiball: u32,

    /// Balls in play once multiball starts.
    #[serde(default = "default_multiball_balls")]
    pub multiball_balls: u32,

    #[serde(default = "default_jackpot_base_value")]
    pub jackpot_base_value: u64,

    /// Added to the jackpot for each multiball already completed this ball.
    #[serde(default = "default_jackpot_value_step")]
    pub jackpot_value_step: u64,

    /// Ramp shots needed to relight the jackpot after the first collection.
    #[serde(default = "default_jackpot_relight_shots")]
    pub jackpot_relight_shots: u32,

    /// Added to the relight requirement on every collection.
    #[serde(default = "default_jackpot_relight_step")]
    pub jackpot_relight_step: u32,

    /// Credited locks (physical, virtual or sneaky) per award.
    #[serde(default = "default_award_threshold")]
    pub award_threshold: u32,
}

fn default_locks_for_multiball() -> u32 {
    3
}

fn default_multiball_balls() -> u32 {
    3
}

fn default_jackpot_base_value() -> u64 {
    1_000_000
}

fn default_jackpot_value_step() -> u64 {
    500_000
}

fn default_jackpot_relight_shots() -> u32 {
    1
}

fn default_jackpot_relight_step() -> u32 {
    1
}

fn default_award_threshold() -> u32 {
    5
}

impl Default for MultiballConfig {
    fn default() -> Self {
        Self {
            locks_for_multiball: default_locks_for_multiball(),
            multiball_balls: default_multiball_balls(),
            jackpot_base_value: default_jackpot_base_value(),
            jackpot_value_step: default_jackpot_value_step(),
            jackpot_relight_shots: default_jackpot_relight_shots(),
            jackpot_relight_step: default_jackpot_relight_step(),
            award_threshold: default_award_threshold(),
        }
    }
}

impl MultiballConfig {
    /// Jackpot value after `completed` multiballs this ball.
    pub fn jackpot_value(&self, completed: u32) -> u64 {
        self.jackpot_base_value + self.jackpot_value_step * completed as u64
    }
}
