//! API integration tests against a live engine task.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;
use orrery_core::{Coil, Notification};
use orrery_server::api::WsMessage;

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new().await;

    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);
    assert_json_path!(health.body, "status", json!("ok"));

    let config = fixture.get("/api/v1/config").await;
    assert_status!(config, StatusCode::OK);
    assert_json_path!(config.body, "total_balls", json!(5));
    assert_json_path!(config.body["engine"]["ball_search"], "enabled", json!(false));
}

#[tokio::test]
async fn test_status_of_idle_machine() {
    let fixture = TestFixture::new().await;

    let status = fixture.get("/api/v1/status").await;
    assert_status!(status, StatusCode::OK);
    assert_json_path!(status.body["game"], "in_progress", json!(false));
    assert_json_path!(status.body["ledger"], "balls_in_trough", json!(5));
    assert_json_path!(status.body["device"], "locked_count", json!(0));
    assert_json_path!(status.body, "accounts_balanced", json!(true));
}

#[tokio::test]
async fn test_metrics_endpoint_reports_ball_locations() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, text) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("orrery_http_requests_total"));
    assert!(text.contains(r#"orrery_balls{location="trough"}"#));
    assert!(text.contains("orrery_engine_commands_total"));
}

// =============================================================================
// Game control
// =============================================================================

#[tokio::test]
async fn test_game_start_puts_a_ball_in_play() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/game/start").await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let status = fixture
        .wait_for_status(|s| s["ledger"]["balls_in_play"] == json!(1))
        .await;
    assert_json_path!(status["ledger"], "balls_in_play", json!(1));
    assert_json_path!(status["ledger"], "balls_in_trough", json!(4));
    assert_json_path!(status["game"], "active_player", json!(0));
    assert_json_path!(status, "accounts_balanced", json!(true));

    let again = fixture.post_empty("/api/v1/game/start").await;
    assert_status!(again, StatusCode::CONFLICT);
    assert!(again.body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn test_turn_rotation_between_players() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;

    let added = fixture.post_empty("/api/v1/game/players").await;
    assert_status!(added, StatusCode::CREATED);
    assert_json_path!(added.body, "player", json!(1));

    // Player 0 still has the turn
    let busy = fixture.post_empty("/api/v1/game/turn/1").await;
    assert_status!(busy, StatusCode::CONFLICT);

    let ended = fixture.post_empty("/api/v1/game/turn/end").await;
    assert_status!(ended, StatusCode::NO_CONTENT);

    let started = fixture.post_empty("/api/v1/game/turn/1").await;
    assert_status!(started, StatusCode::OK);
    assert_json_path!(started.body, "player", json!(1));
    assert_json_path!(started.body["deficit"], "physical", json!(0));
    assert_json_path!(started.body["deficit"], "credited", json!(0));

    let status = fixture.get("/api/v1/status").await;
    assert_json_path!(status.body["game"], "player_count", json!(2));
    assert_json_path!(status.body["game"], "active_player", json!(1));
}

#[tokio::test]
async fn test_unknown_player_is_not_found() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;
    fixture.post_empty("/api/v1/game/turn/end").await;

    let response = fixture.post_empty("/api/v1/game/turn/3").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_player_limit_is_bad_request() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;

    for expected in 1..4 {
        let added = fixture.post_empty("/api/v1/game/players").await;
        assert_json_path!(added.body, "player", json!(expected));
    }

    let response = fixture.post_empty("/api/v1/game/players").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rule_commands_need_a_game() {
    let fixture = TestFixture::new().await;

    for path in [
        "/api/v1/game/end",
        "/api/v1/game/players",
        "/api/v1/game/turn/end",
        "/api/v1/game/qualify",
    ] {
        let response = fixture.post_empty(path).await;
        assert_status!(response, StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn test_end_game_closes_the_turn() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;

    let qualify = fixture.post_empty("/api/v1/game/qualify").await;
    assert_status!(qualify, StatusCode::OK);
    assert!(qualify.body["lit"].is_boolean());

    let ended = fixture.post_empty("/api/v1/game/end").await;
    assert_status!(ended, StatusCode::NO_CONTENT);

    let status = fixture.get("/api/v1/status").await;
    assert_json_path!(status.body["game"], "in_progress", json!(false));

    let audit = fixture.wait_for_audit("turn_ended", 1).await;
    assert_json_path!(audit, "total", json!(1));
    assert_json_path!(audit["events"][0], "player", json!(0));
}

// =============================================================================
// Switches and device
// =============================================================================

#[tokio::test]
async fn test_unknown_switch_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/switches/flipper", json!({ "state": "active" }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("flipper"));
}

#[tokio::test]
async fn test_switch_with_bad_state_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/switches/drain", json!({ "state": "closed" }))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_capture_without_a_turn_is_sent_back_out() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/switches/holder_entry", json!({ "state": "active" }))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let status = fixture.get("/api/v1/status").await;
    assert_json_path!(status.body["device"], "locked_count", json!(1));
    assert_json_path!(status.body["device"], "pending_eject", json!(1));
    assert_json_path!(status.body, "accounts_balanced", json!(true));
    assert!(fixture.actuators.is_enabled(Coil::PlanetMotor));

    // The release already claimed the only ball
    let eject = fixture
        .post("/api/v1/device/eject", json!({ "count": 3 }))
        .await;
    assert_status!(eject, StatusCode::OK);
    assert_json_path!(eject.body, "requested", json!(3));
    assert_json_path!(eject.body, "accepted", json!(0));
}

#[tokio::test]
async fn test_ball_search_cycles_an_empty_holder() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/device/search").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "outcome", json!("search_cycle"));

    let audit = fixture.wait_for_audit("ball_search", 1).await;
    assert_json_path!(audit["events"][0]["data"], "outcome", json!("search_cycle"));
}

#[tokio::test]
async fn test_trough_launch_feeds_extra_balls() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;

    let response = fixture
        .post("/api/v1/trough/launch", json!({ "count": 2 }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "ejected", json!(0));
    assert_json_path!(response.body, "fed", json!(2));
    assert_json_path!(response.body, "unfilled", json!(0));

    let status = fixture
        .wait_for_status(|s| s["ledger"]["balls_in_play"] == json!(3))
        .await;
    assert_json_path!(status["ledger"], "balls_in_play", json!(3));
    assert_json_path!(status["ledger"], "balls_requested", json!(3));
    assert_json_path!(status, "accounts_balanced", json!(true));
}

// =============================================================================
// Audit and notifications
// =============================================================================

#[tokio::test]
async fn test_audit_filters_by_player_and_pages() {
    let fixture = TestFixture::new().await;
    fixture.post_empty("/api/v1/game/start").await;
    fixture.post_empty("/api/v1/game/players").await;
    fixture.post_empty("/api/v1/game/turn/end").await;
    fixture.post_empty("/api/v1/game/turn/1").await;
    fixture.post_empty("/api/v1/game/turn/end").await;
    fixture.wait_for_audit("turn_ended", 2).await;

    let player_one = fixture
        .get("/api/v1/audit?event_type=turn_started&player=1")
        .await;
    assert_status!(player_one, StatusCode::OK);
    assert_json_path!(player_one.body, "total", json!(1));

    let paged = fixture.get("/api/v1/audit?event_type=turn_ended&limit=1").await;
    assert_json_path!(paged.body, "total", json!(2));
    assert_json_path!(paged.body, "limit", json!(1));
    assert_eq!(paged.body["events"].as_array().unwrap().len(), 1);

    // Limit is clamped to at least one record
    let clamped = fixture.get("/api/v1/audit?limit=0").await;
    assert_json_path!(clamped.body, "limit", json!(1));
}

#[tokio::test]
async fn test_rule_notifications_are_broadcast() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.ws_broadcaster.subscribe();

    fixture.post_empty("/api/v1/game/start").await;
    fixture
        .wait_for_status(|s| s["ledger"]["balls_in_play"] == json!(1))
        .await;
    fixture
        .post("/api/v1/switches/drain", json!({ "state": "active" }))
        .await;

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(WsMessage::Rule {
                    notification: Notification::BallEnded { player },
                }) => return player,
                Ok(_) => continue,
                Err(e) => panic!("broadcast closed: {}", e),
            }
        }
    })
    .await
    .expect("no BallEnded notification");
    assert_eq!(ended, 0);
}

#[tokio::test]
async fn test_stopped_engine_is_unavailable() {
    let fixture = TestFixture::new().await;
    fixture.engine.shutdown();

    let mut response = fixture.get("/api/v1/status").await;
    for _ in 0..100 {
        if response.status == StatusCode::SERVICE_UNAVAILABLE {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        response = fixture.get("/api/v1/status").await;
    }
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);

    // Health does not depend on the engine
    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);
}
