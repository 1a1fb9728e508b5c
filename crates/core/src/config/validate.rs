use super::{types::Config, ConfigError};

/// Largest ball complement the ledger is sized for.
const MAX_TOTAL_BALLS: u32 = 8;

/// Validate configuration
/// Currently validates:
/// - Ball complement is within 1..=8 and can back the holder capacity
/// - Device timings are non-zero and fast timings never exceed conservative ones
/// - Multiball needs at least one lock and two balls
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let total = config.machine.total_balls;
    if total == 0 || total > MAX_TOTAL_BALLS {
        return Err(ConfigError::ValidationError(format!(
            "machine.total_balls must be between 1 and {}, got {}",
            MAX_TOTAL_BALLS, total
        )));
    }

    let device = &config.device;
    if device.capacity == 0 || device.capacity > total {
        return Err(ConfigError::ValidationError(format!(
            "device.capacity must be between 1 and machine.total_balls ({}), got {}",
            total, device.capacity
        )));
    }

    for (name, value) in [
        ("gate_pulse_ms", device.gate_pulse_ms),
        ("magnet_hold_ms", device.magnet_hold_ms),
        ("fast_magnet_hold_ms", device.fast_magnet_hold_ms),
        ("magnet_release_ms", device.magnet_release_ms),
        ("crane_pulse_ms", device.crane_pulse_ms),
        ("settle_ms", device.settle_ms),
        ("fast_settle_ms", device.fast_settle_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "device.{} cannot be 0",
                name
            )));
        }
    }

    if device.fast_settle_ms > device.settle_ms {
        return Err(ConfigError::ValidationError(
            "device.fast_settle_ms cannot exceed device.settle_ms".to_string(),
        ));
    }
    if device.fast_magnet_hold_ms > device.magnet_hold_ms {
        return Err(ConfigError::ValidationError(
            "device.fast_magnet_hold_ms cannot exceed device.magnet_hold_ms".to_string(),
        ));
    }

    let multiball = &config.multiball;
    if multiball.locks_for_multiball == 0 || multiball.locks_for_multiball > device.capacity {
        return Err(ConfigError::ValidationError(format!(
            "multiball.locks_for_multiball must be between 1 and device.capacity ({})",
            device.capacity
        )));
    }
    if multiball.multiball_balls < 2 || multiball.multiball_balls > total {
        return Err(ConfigError::ValidationError(format!(
            "multiball.multiball_balls must be between 2 and machine.total_balls ({})",
            total
        )));
    }
    if multiball.award_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "multiball.award_threshold cannot be 0".to_string(),
        ));
    }

    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.engine.tick_ms == 0 {
        return Err(ConfigError::ValidationError(
            "engine.tick_ms cannot be 0".to_string(),
        ));
    }

    let search = &config.engine.ball_search;
    if search.enabled && (search.idle_timeout_ms == 0 || search.interval_ms == 0) {
        return Err(ConfigError::ValidationError(
            "engine.ball_search timings cannot be 0 while enabled".to_string(),
        ));
    }

    Ok(())
}
