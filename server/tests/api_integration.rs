//! Integration tests for the roundcast HTTP API
//!
//! Drives the router in-process with `oneshot`, against a service whose
//! clock is pinned so schedule answers are exact.

use axum::body::Body;
use axum::http::StatusCode;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use http::{Method, Request};
use roundcast::SchedulerService;
use roundcast::auth::SharedSecret;
use roundcast::clock::ManualClock;
use roundcast::config::StationConfig;
use roundcast_server::api::{AppState, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "vivekfy_secret";

fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
}

fn setup_test_server(now: DateTime<Utc>) -> (axum::Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let service = Arc::new(SchedulerService::new(
        StationConfig::default(),
        clock.clone(),
        Arc::new(SharedSecret::new(KEY)),
    ));
    (create_router(AppState { service }), clock)
}

async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => {
            request = request.header("content-type", "application/json");
            request.body(Body::from(json_body.to_string())).unwrap()
        }
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn add_song(app: &axum::Router, id: &str, duration: u64) -> Value {
    let (status, body) = make_request(
        app,
        Method::POST,
        &format!("/api/playlist?token={}", KEY),
        Some(json!({
            "id": id,
            "title": format!("Song {}", id),
            "artist": "Various",
            "image": format!("https://img/{}.jpg", id),
            "url": format!("https://cdn/{}.mp4", id),
            "duration": duration,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "add failed: {}", body);
    body
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_test_server(day_start());
    let (status, body) = make_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_live_with_empty_playlist() {
    let (app, _) = setup_test_server(day_start());
    let (status, body) = make_request(&app, Method::GET, "/api/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "noSongs");
    assert_eq!(body["message"], "No songs in playlist");
}

#[tokio::test]
async fn test_add_then_live() {
    let (app, _) = setup_test_server(day_start() + TimeDelta::seconds(200));
    let body = add_song(&app, "s1", 180).await;
    assert_eq!(body["added"], true);
    assert_eq!(body["track"]["id"], "s1");
    assert_eq!(body["playlist"]["version"], 1);
    add_song(&app, "s2", 180).await;

    let (status, body) = make_request(&app, Method::GET, "/api/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "playing");
    assert_eq!(body["status"], "onAir");
    assert_eq!(body["event"]["track"]["id"], "s2");
    assert_eq!(body["elapsed"], 20.0);
    assert_eq!(
        body["serverNow"],
        (day_start() + TimeDelta::seconds(200)).timestamp_millis()
    );
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_mutations_require_token() {
    let (app, _) = setup_test_server(day_start());

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/playlist",
        Some(json!({"title": "x", "url": "x.mp3"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = make_request(&app, Method::GET, "/api/playlist?token=wrong", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = make_request(&app, Method::GET, "/api/version", None).await;
    assert_eq!(body["version"], 0);
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let (app, _) = setup_test_server(day_start());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/playlist")
        .header("authorization", format!("Bearer {}", KEY))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_payload_is_bad_request() {
    let (app, _) = setup_test_server(day_start());
    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist?token={}", KEY),
        Some(json!({"title": "No url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("url"));

    let (_, body) = make_request(&app, Method::GET, "/api/version", None).await;
    assert_eq!(body["version"], 0);
}

#[tokio::test]
async fn test_remove_by_body_id() {
    let (app, _) = setup_test_server(day_start());
    add_song(&app, "a", 100).await;
    add_song(&app, "b", 100).await;

    let path = format!("/api/playlist?token={}", KEY);
    let (status, body) =
        make_request(&app, Method::DELETE, &path, Some(json!({"id": "a"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    assert_eq!(body["playlist"]["tracks"].as_array().unwrap().len(), 1);
    assert_eq!(body["playlist"]["version"], 3);

    let (status, body) =
        make_request(&app, Method::DELETE, &path, Some(json!({"id": "ghost"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);
    assert_eq!(body["playlist"]["version"], 3);
}

#[tokio::test]
async fn test_reorder() {
    let (app, _) = setup_test_server(day_start());
    for id in ["a", "b", "c"] {
        add_song(&app, id, 100).await;
    }
    let (status, body) = make_request(
        &app,
        Method::PUT,
        &format!("/api/playlist/order?token={}", KEY),
        Some(json!({"ids": ["c"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["tracks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_override_round_trip() {
    let (app, _) = setup_test_server(day_start() + TimeDelta::hours(6));
    add_song(&app, "a", 180).await;
    add_song(&app, "b", 200).await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist/b/override?token={}", KEY),
        Some(json!({"hour": 9, "minute": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let nine = day_start() + TimeDelta::hours(9);
    assert_eq!(body["startOverride"], nine.timestamp_millis());

    let (_, body) = make_request(&app, Method::GET, "/api/schedule", None).await;
    let pinned: Vec<&Value> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["pinned"] == true)
        .collect();
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0]["start"], nine.timestamp_millis());
    assert_eq!(pinned[0]["track"]["id"], "b");

    let (status, body) = make_request(
        &app,
        Method::DELETE,
        &format!("/api/playlist/b/override?token={}", KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("startOverride").is_none());
}

#[tokio::test]
async fn test_override_with_time_string() {
    let (app, _) = setup_test_server(day_start());
    add_song(&app, "a", 180).await;
    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist/a/override?token={}", KEY),
        Some(json!({"time": "21:30"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["startOverride"],
        (day_start() + TimeDelta::minutes(21 * 60 + 30)).timestamp_millis()
    );
}

#[tokio::test]
async fn test_override_checks_token_before_body() {
    let (app, _) = setup_test_server(day_start());
    add_song(&app, "a", 180).await;
    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/playlist/a/override",
        Some(json!({"time": "bogus"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist/a/override?token={}", KEY),
        Some(json!({"time": "bogus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_override_unknown_track_is_404() {
    let (app, _) = setup_test_server(day_start());
    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist/ghost/override?token={}", KEY),
        Some(json!({"hour": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_override_out_of_range_is_400() {
    let (app, _) = setup_test_server(day_start());
    add_song(&app, "a", 180).await;
    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/playlist/a/override?token={}", KEY),
        Some(json!({"hour": 24, "minute": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedule_follows_clock() {
    let (app, clock) = setup_test_server(day_start() + TimeDelta::hours(23));
    add_song(&app, "a", 3600).await;

    let (_, body) = make_request(&app, Method::GET, "/api/schedule", None).await;
    assert_eq!(body["events"][0]["start"], day_start().timestamp_millis());

    clock.advance(TimeDelta::hours(2));
    let (_, body) = make_request(&app, Method::GET, "/api/schedule", None).await;
    let tomorrow = day_start() + TimeDelta::days(1);
    assert_eq!(body["events"][0]["start"], tomorrow.timestamp_millis());
    assert_eq!(body["events"].as_array().unwrap().len(), 24);
}
