//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the orrery server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Engine command counts
//! - Ball locations and game state (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

use orrery_core::MachineSnapshot;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "orrery_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orrery_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "orrery_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "orrery_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orrery_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("orrery_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orrery_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Commands processed by the engine task.
pub static ENGINE_COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orrery_engine_commands_total",
            "Commands processed by the engine",
        ),
        &["command"],
    )
    .unwrap()
});

// =============================================================================
// Machine State (collected dynamically)
// =============================================================================

/// Balls by location.
pub static BALLS_BY_LOCATION: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("orrery_balls", "Current ball count by location"),
        &["location"],
    )
    .unwrap()
});

/// Balls the game believes are in play.
pub static BALLS_REQUESTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "orrery_balls_requested",
        "Balls in play plus committed launches",
    )
    .unwrap()
});

/// Game in progress (1) or not (0).
pub static GAME_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "orrery_game_in_progress",
        "Whether a game is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Ledger partition and device mirror agree (1) or not (0).
pub static ACCOUNTS_BALANCED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "orrery_accounts_balanced",
        "Whether ball accounting is consistent (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Engine
    registry
        .register(Box::new(ENGINE_COMMANDS_TOTAL.clone()))
        .unwrap();

    // Machine state
    registry
        .register(Box::new(BALLS_BY_LOCATION.clone()))
        .unwrap();
    registry
        .register(Box::new(BALLS_REQUESTED.clone()))
        .unwrap();
    registry
        .register(Box::new(GAME_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(ACCOUNTS_BALANCED.clone()))
        .unwrap();

    // Core metrics (device, ledger, multiball)
    for metric in orrery_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Update gauges from a machine snapshot.
///
/// Called before encoding so the ball locations are current.
pub fn collect_dynamic_metrics(snapshot: &MachineSnapshot) {
    let ledger = &snapshot.ledger;
    for (location, count) in [
        ("trough", ledger.balls_in_trough),
        ("feed", ledger.balls_pending_feed),
        ("in_play", ledger.balls_in_play),
        ("stealth_in_play", ledger.balls_stealth_in_play),
        ("locked", ledger.balls_locked),
        ("pending_eject", ledger.balls_pending_eject),
    ] {
        BALLS_BY_LOCATION
            .with_label_values(&[location])
            .set(count as i64);
    }
    BALLS_REQUESTED.set(ledger.balls_requested as i64);
    GAME_IN_PROGRESS.set(if snapshot.game.in_progress { 1 } else { 0 });
    ACCOUNTS_BALANCED.set(if snapshot.accounts_balanced { 1 } else { 0 });
}

/// Normalize a path for metric labels (replace player indexes with placeholders).
pub fn normalize_path(path: &str) -> String {
    static NUMERIC: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());
    NUMERIC.replace_all(path, "/{id}$1").to_string()
}
