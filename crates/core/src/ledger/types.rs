//! Types for ball accounting.

use serde::{Deserialize, Serialize};

/// Request handed to the feed-lane launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub count: u32,
    /// Stealth balls are fed toward the holder and never change the
    /// player-visible ball count.
    pub stealth: bool,
}

/// How a `launch_balls` request was satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    /// Balls requested from the holder.
    pub ejected: u32,
    /// Balls requested from the feed lane.
    pub fed: u32,
    /// Balls that could not be sourced at all.
    pub unfilled: u32,
}

impl LaunchPlan {
    pub fn total(&self) -> u32 {
        self.ejected + self.fed
    }
}

/// Point-in-time view of every counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total_balls: u32,
    pub balls_in_trough: u32,
    pub balls_in_play: u32,
    pub balls_stealth_in_play: u32,
    pub balls_locked: u32,
    pub balls_pending_eject: u32,
    pub balls_pending_feed: u32,
    pub balls_pending_launch: u32,
    pub balls_pending_stealth_launch: u32,
    pub balls_requested: u32,
}
