use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::device::{DeviceConfig, EjectStrategy};
use crate::multiball::MultiballConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub multiball: MultiballConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Physical machine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MachineConfig {
    /// Fixed number of balls installed in the machine.
    #[serde(default = "default_total_balls")]
    pub total_balls: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            total_balls: default_total_balls(),
        }
    }
}

fn default_total_balls() -> u32 {
    5
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Event loop configuration for the hosted engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// How often the timer queue is advanced (milliseconds).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Delay between a feed launch request and its simulated completion.
    #[serde(default = "default_launch_delay_ms")]
    pub launch_delay_ms: u64,
    #[serde(default)]
    pub ball_search: BallSearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            launch_delay_ms: default_launch_delay_ms(),
            ball_search: BallSearchConfig::default(),
        }
    }
}

fn default_tick_ms() -> u64 {
    10
}

fn default_launch_delay_ms() -> u64 {
    1500
}

/// Ball search service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BallSearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Switch silence required before a search starts (milliseconds).
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Interval between repeated searches while still silent (milliseconds).
    #[serde(default = "default_search_interval_ms")]
    pub interval_ms: u64,
}

impl Default for BallSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_timeout_ms: default_idle_timeout_ms(),
            interval_ms: default_search_interval_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_idle_timeout_ms() -> u64 {
    10_000
}

fn default_search_interval_ms() -> u64 {
    5_000
}

/// Flattened config view for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub total_balls: u32,
    pub device: SanitizedDeviceConfig,
    pub multiball: MultiballConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDeviceConfig {
    pub strategy: String,
    pub capacity: u32,
    pub settle_ms: u64,
    pub fast_settle_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            total_balls: config.machine.total_balls,
            device: SanitizedDeviceConfig {
                strategy: match config.device.strategy {
                    EjectStrategy::Conservative => "conservative".to_string(),
                    EjectStrategy::Fast => "fast".to_string(),
                },
                capacity: config.device.capacity,
                settle_ms: config.device.settle_ms,
                fast_settle_ms: config.device.fast_settle_ms,
            },
            multiball: config.multiball.clone(),
            server: config.server.clone(),
            engine: config.engine.clone(),
        }
    }
}
