//! Integration tests for the memo REST API.
//!
//! Drives the full router (middleware included) against an in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, FixedOffset};
use lendmemo_server::{create_server, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    create_server(AppState::in_memory().unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn loan() -> Value {
    json!({
        "lentByName": "A",
        "borrowedByName": "Ben",
        "amountOrItem": "5000 yen",
        "loanDate": "2024-04-01",
        "dueDate": "2024-05-01",
        "memo": "for the concert tickets"
    })
}

async fn create(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/memo", Some(loan())).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_returns_id_and_created_history() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/memo", Some(loan())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Memo created");
    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());

    let (status, memo) = send(&app, Method::GET, &format!("/api/memo/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(memo["id"], id);
    assert_eq!(memo["lentByName"], "A");
    assert_eq!(memo["dueDate"], "2024-05-01");
    assert_eq!(memo["status"], "active");

    let histories = memo["histories"].as_array().unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0]["action"], "created");
    assert_eq!(histories[0]["editorName"], "A");
}

#[tokio::test]
async fn test_create_missing_field_is_bad_request() {
    for field in ["lentByName", "borrowedByName", "amountOrItem", "loanDate"] {
        let app = app();
        let mut body = loan();
        body.as_object_mut().unwrap().remove(field);

        let (status, error) = send(&app, Method::POST, "/api/memo", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", field);
        assert_eq!(error["error"]["code"], "BAD_REQUEST");
        assert_eq!(error["error"]["details"]["field"], field);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/memo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_memo_is_not_found() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/memo/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/memo/nope",
        Some(json!({"editorName": "Ben", "memo": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_requires_editor_name() {
    let app = app();
    let id = create(&app).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/memo/{}", id),
        Some(json!({"lentByName": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_noop_update_adds_no_history() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "Ben", "lentByName": "A", "dueDate": "2024-05-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No changes");

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(memo["histories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_records_changes() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "Ben", "lentByName": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Memo updated");

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(memo["lentByName"], "B");
    let histories = memo["histories"].as_array().unwrap();
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[1]["action"], "edited");
    assert_eq!(histories[1]["editorName"], "Ben");
    assert_eq!(
        histories[1]["changes"],
        json!({"lentByName": {"from": "A", "to": "B"}})
    );
}

#[tokio::test]
async fn test_clearing_optional_fields() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "A", "dueDate": null, "memo": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(memo["dueDate"], Value::Null);
    assert_eq!(memo["memo"], Value::Null);
    assert_eq!(
        memo["histories"][1]["changes"]["dueDate"],
        json!({"from": "2024-05-01", "to": null})
    );
}

#[tokio::test]
async fn test_mark_returned() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "Ben", "status": "returned"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(memo["status"], "returned");
    let last = memo["histories"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["action"], "returned");
    assert_eq!(last["changes"]["status"], json!({"from": "active", "to": "returned"}));
}

#[tokio::test]
async fn test_invalid_status_is_bad_request() {
    let app = app();
    let id = create(&app).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/memo/{}", id),
        Some(json!({"editorName": "Ben", "status": "lost"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stale_version_is_conflict() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "Ben", "memo": "first", "expectedVersion": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"editorName": "A", "memo": "second", "expectedVersion": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["details"]["currentVersion"], 2);

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(memo["memo"], "first");
    assert_eq!(memo["version"], 2);
}

#[tokio::test]
async fn test_history_is_ascending() {
    let app = app();
    let id = create(&app).await;
    let uri = format!("/api/memo/{}", id);

    for (editor, item) in [("Ben", "6000 yen"), ("A", "7000 yen"), ("Ben", "8000 yen")] {
        let (status, _) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"editorName": editor, "amountOrItem": item})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, memo) = send(&app, Method::GET, &uri, None).await;
    let histories = memo["histories"].as_array().unwrap();
    assert_eq!(histories.len(), 4);

    let stamps: Vec<DateTime<FixedOffset>> = histories
        .iter()
        .map(|h| DateTime::parse_from_rfc3339(h["createdAt"].as_str().unwrap()).unwrap())
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(histories[3]["changes"]["amountOrItem"]["to"], "8000 yen");
}
