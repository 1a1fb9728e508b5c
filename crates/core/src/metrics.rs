//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ball-lock device (locks, ejects, releases, sensor noise, searches)
//! - Ball ledger (clamped counters)
//! - Multiball rules (multiballs, jackpots)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Device Metrics
// =============================================================================

/// Balls captured by the holder, by kind.
pub static LOCKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orrery_locks_total", "Balls captured by the holder"),
        &["kind"], // "armed", "sneaky", "virtual"
    )
    .unwrap()
});

/// Balls requested for eject.
pub static EJECT_REQUESTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orrery_eject_requests_total",
        "Balls requested to be ejected from the holder",
    )
    .unwrap()
});

/// Confirmed releases from the holder.
pub static BALLS_RELEASED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orrery_balls_released_total",
        "Releases confirmed by magnet timer and release arm",
    )
    .unwrap()
});

/// Eject sequences started, by strategy.
pub static EJECT_SEQUENCES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orrery_eject_sequences_total", "Eject sequences started"),
        &["strategy"], // "conservative", "fast"
    )
    .unwrap()
});

/// Sensor transitions ignored because the device was not waiting for them.
pub static STRAY_SENSOR_TRIGGERS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orrery_stray_sensor_triggers_total",
            "Sensor transitions ignored outside their window",
        ),
        &["switch"],
    )
    .unwrap()
});

/// Recovery searches requested by the ball-search service.
pub static BALL_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orrery_ball_searches_total", "Recovery searches requested"),
        &["outcome"], // "kick", "search_cycle", "noop"
    )
    .unwrap()
});

// =============================================================================
// Ledger Metrics
// =============================================================================

/// Counter updates clamped at a bound instead of under/overflowing.
pub static COUNT_CLAMPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orrery_count_clamps_total",
            "Counter updates clamped to stay within bounds",
        ),
        &["counter"],
    )
    .unwrap()
});

// =============================================================================
// Multiball Metrics
// =============================================================================

/// Multiballs started.
pub static MULTIBALLS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orrery_multiballs_total", "Multiballs started").unwrap()
});

/// Jackpots collected.
pub static JACKPOTS_COLLECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orrery_jackpots_total", "Jackpots collected").unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Device
        Box::new(LOCKS_TOTAL.clone()),
        Box::new(EJECT_REQUESTS.clone()),
        Box::new(BALLS_RELEASED.clone()),
        Box::new(EJECT_SEQUENCES.clone()),
        Box::new(STRAY_SENSOR_TRIGGERS.clone()),
        Box::new(BALL_SEARCHES.clone()),
        // Ledger
        Box::new(COUNT_CLAMPS.clone()),
        // Multiball
        Box::new(MULTIBALLS_STARTED.clone()),
        Box::new(JACKPOTS_COLLECTED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        LOCKS_TOTAL.with_label_values(&["armed"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "orrery_locks_total"));
    }
}
