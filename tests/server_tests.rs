//! Integration tests for the HTTP API router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::Datelike;
use serde_json::{Value, json};
use std::time::Duration;
use taskflow::auth::AuthGate;
use taskflow::fixtures::Fixtures;
use taskflow::server::{AppState, build_router};
use taskflow::session::MemorySessionStore;
use taskflow::store::RecordStore;
use taskflow::workspace::Workspace;
use tower::ServiceExt;

fn app() -> Router {
    let (store, credentials) = RecordStore::seeded(Fixtures::seed().expect("seed"));
    let workspace = Workspace::new(store, Box::new(MemorySessionStore::new()));
    let gate = AuthGate::new(credentials).with_login_delay(Duration::ZERO);
    build_router(AppState::new(workspace, gate))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn login(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        Some(json!({"email": email, "password": "demo123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn health_reports_version() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn views_require_sign_in() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NOT_SIGNED_IN");
}

#[tokio::test]
async fn bad_credentials_are_generic() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": "sarah@taskflow.com", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_selects_first_project_and_lists_tasks() {
    let app = app();
    let session = login(&app, "sarah@taskflow.com").await;
    assert_eq!(session["user"]["name"], "Sarah Chen");
    assert_eq!(session["selected_project"]["id"], "project-1");

    let (status, body) = send(&app, Method::GET, "/api/tasks?status=todo", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["task-1"]);

    let (_, body) = send(&app, Method::GET, "/api/tasks?sort=priority&status=all", None).await;
    assert_eq!(body[0]["id"], "task-2");
}

#[tokio::test]
async fn invalid_filter_is_rejected() {
    let app = app();
    login(&app, "sarah@taskflow.com").await;
    let (status, body) = send(&app, Method::GET, "/api/tasks?status=blocked", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "status");
}

#[tokio::test]
async fn patch_status_appears_in_activity() {
    let app = app();
    login(&app, "michael@taskflow.com").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/tasks/task-2",
        Some(json!({"status": "review"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "review");

    let (_, logs) = send(&app, Method::GET, "/api/tasks/task-2/activity", None).await;
    let last = logs.as_array().and_then(|l| l.last()).expect("log");
    assert_eq!(last["action"], "status_change");
    assert_eq!(last["user_id"], "user-2");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/tasks/task-404",
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn comments_and_task_creation() {
    let app = app();
    login(&app, "emma@taskflow.com").await;

    let (status, comment) = send(
        &app,
        Method::POST,
        "/api/tasks/task-1/comments",
        Some(json!({"content": "Mockups uploaded"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["user_id"], "user-3");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tasks/task-1/comments",
        Some(json!({"content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, comments) = send(&app, Method::GET, "/api/tasks/task-1/comments", None).await;
    assert_eq!(comments.as_array().map(Vec::len), Some(1));

    let (status, task) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "Icon set", "priority": "low"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["creator_id"], "user-3");
    assert_eq!(task["project_id"], "project-1");

    let (status, body) = send(&app, Method::POST, "/api/tasks", Some(json!({"title": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "title");
}

#[tokio::test]
async fn project_selection_is_limited_to_visible_projects() {
    let app = app();
    login(&app, "david@taskflow.com").await;

    let (_, body) = send(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(2));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/projects/selected",
        Some(json!({"project_id": "project-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/projects/selected",
        Some(json!({"project_id": "project-3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_project"]["id"], "project-3");

    let (_, board) = send(&app, Method::GET, "/api/board", None).await;
    assert_eq!(board["todo"][0]["id"], "task-6");
    assert_eq!(board["done"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn calendar_and_metrics_views() {
    let app = app();
    login(&app, "michael@taskflow.com").await;

    let (status, days) = send(&app, Method::GET, "/api/calendar?year=2024&month=12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(days.as_array().map(|d| d.len() % 7), Some(0));

    let (status, _) = send(&app, Method::GET, "/api/calendar?year=2024&month=13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, report) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["productivity"]["total_tasks"], 2);
    assert_eq!(report["productivity"]["completed_tasks"], 1);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    login(&app, "sarah@taskflow.com").await;

    let (status, _) = send(&app, Method::POST, "/api/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, session) = send(&app, Method::GET, "/api/session", None).await;
    assert!(session["user"].is_null());
}

#[tokio::test]
async fn huge_durations_keep_metrics_available() {
    let app = app();
    login(&app, "emma@taskflow.com").await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/tasks/task-1/behavior",
            Some(json!({"action": "view", "duration_ms": u64::MAX})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, report) = send(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["behavior"]["average_session_minutes"].as_f64().is_some());

    let (status, _) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn calendar_years_out_of_range_are_rejected() {
    let app = app();
    login(&app, "sarah@taskflow.com").await;

    let uri = format!("/api/calendar?year={}&month=12", chrono::NaiveDate::MAX.year());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "year");

    // The earliest month either fits or is rejected, but never takes the server down
    let uri = format!("/api/calendar?year={}&month=1", chrono::NaiveDate::MIN.year());
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert!(status == StatusCode::OK || status == StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn task_history_needs_sign_in() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/tasks/task-1/comments", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/tasks/task-1/activity", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn members_only_touch_their_projects() {
    let app = app();
    login(&app, "david@taskflow.com").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/tasks/task-5",
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/tasks/task-1",
        Some(json!({"project_id": "project-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROJECT_NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/api/tasks/task-5/comments", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
