//! Device timing configuration.

use serde::{Deserialize, Serialize};

/// How consecutive releases are sequenced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EjectStrategy {
    /// Finish each release, including the full settle check, before
    /// positioning for the next one.
    #[default]
    Conservative,
    /// Pre-position the holder for the next release while the current ball
    /// settles, using the auto-stop rule on the position sensor.
    Fast,
}

impl EjectStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EjectStrategy::Conservative => "conservative",
            EjectStrategy::Fast => "fast",
        }
    }
}

/// Configuration for the ball-lock device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub strategy: EjectStrategy,

    /// Balls the holder can physically store.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Gate pulse fired by the lock lane rule.
    #[serde(default = "default_gate_pulse")]
    pub gate_pulse_ms: u64,

    /// Magnet hold before release (conservative strategy).
    #[serde(default = "default_magnet_hold")]
    pub magnet_hold_ms: u64,

    /// Magnet hold before release (fast strategy).
    #[serde(default = "default_fast_magnet_hold")]
    pub fast_magnet_hold_ms: u64,

    /// Time for the magnet to fully let go once disabled.
    #[serde(default = "default_magnet_release")]
    pub magnet_release_ms: u64,

    #[serde(default = "default_crane_pulse")]
    pub crane_pulse_ms: u64,

    /// Post-release settle check (conservative strategy).
    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    /// Post-release settle check (fast strategy).
    #[serde(default = "default_fast_settle")]
    pub fast_settle_ms: u64,
}

fn default_capacity() -> u32 {
    3
}

fn default_gate_pulse() -> u64 {
    30
}

fn default_magnet_hold() -> u64 {
    250
}

fn default_fast_magnet_hold() -> u64 {
    120
}

fn default_magnet_release() -> u64 {
    200
}

fn default_crane_pulse() -> u64 {
    40
}

fn default_settle() -> u64 {
    1000 // 1 second
}

fn default_fast_settle() -> u64 {
    350
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            strategy: EjectStrategy::default(),
            capacity: default_capacity(),
            gate_pulse_ms: default_gate_pulse(),
            magnet_hold_ms: default_magnet_hold(),
            fast_magnet_hold_ms: default_fast_magnet_hold(),
            magnet_release_ms: default_magnet_release(),
            crane_pulse_ms: default_crane_pulse(),
            settle_ms: default_settle(),
            fast_settle_ms: default_fast_settle(),
        }
    }
}

impl DeviceConfig {
    /// Magnet hold for the configured strategy.
    pub fn hold_ms(&self) -> u64 {
        match self.strategy {
            EjectStrategy::Conservative => self.magnet_hold_ms,
            EjectStrategy::Fast => self.fast_magnet_hold_ms,
        }
    }

    /// Settle window for the configured strategy.
    pub fn settle_window_ms(&self) -> u64 {
        match self.strategy {
            EjectStrategy::Conservative => self.settle_ms,
            EjectStrategy::Fast => self.fast_settle_ms,
        }
    }
}
