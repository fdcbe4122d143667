use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mockable::DefaultClock;
use serde_json::{json, Value};
use tower::ServiceExt;
use trip_backup::{
    config::{AppConfig, MEMORY_DATABASE_URL},
    routes::create_router,
    services::{
        backup::BackupService,
        store::{MemorySnapshotStore, SnapshotStore},
    },
    state::AppState,
};

fn app() -> (Router, Arc<MemorySnapshotStore>) {
    let store = Arc::new(MemorySnapshotStore::new());
    let config = AppConfig {
        database_url: MEMORY_DATABASE_URL.into(),
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        max_connections: 1,
    };
    let backup = BackupService::new(store.clone(), Arc::new(DefaultClock));
    (create_router(AppState::new(config, backup)), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn post(body: &str, content_type: &str) -> Request<Body> {
    Request::post("/")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_owned()))
        .expect("request")
}

#[tokio::test]
async fn save_then_fetch_returns_what_was_sent() {
    let (app, store) = app();

    let (status, saved) = send(
        &app,
        post(
            r#"{"tripId":"t1","dates":["2024-01-01"],"activities":{},"expenses":{},"members":["alice"]}"#,
            "application/json",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["success"], json!(true));
    assert_eq!(saved["message"], json!("Backup saved successfully"));
    let ts1 = saved["timestamp"].as_str().expect("timestamp").to_owned();

    let (status, fetched) = send(&app, get("/?tripId=t1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched,
        json!({
            "success": true,
            "data": {
                "tripId": "t1",
                "dates": ["2024-01-01"],
                "activities": {},
                "expenses": {},
                "members": ["alice"],
                "updatedAt": ts1,
            }
        })
    );

    let (_, _) = send(
        &app,
        post(r#"{"tripId":"t1","members":["alice","bob"]}"#, "application/json"),
    )
    .await;
    let (_, refetched) = send(&app, get("/?tripId=t1&action=import")).await;
    let data = &refetched["data"];
    assert_eq!(data["members"], json!(["alice", "bob"]));
    assert_eq!(data["dates"], json!([]));
    assert!(data["updatedAt"].as_str().expect("updatedAt") > ts1.as_str());

    assert_eq!(store.history("t1").await.unwrap().len(), 2);
    assert_eq!(store.latest_row_count("t1").await, 1);
}

#[tokio::test]
async fn unknown_trip_is_success_with_null_data() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/?tripId=never-saved")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "data": null, "message": "No backup found for this trip" })
    );
}

#[tokio::test]
async fn missing_trip_id_is_a_client_error_on_both_paths() {
    let (app, _) = app();

    for uri in ["/", "/?tripId=", "/?action=fetch"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "GET {uri}");
        assert_eq!(body, json!({ "error": "Missing tripId" }));
    }

    for payload in [r#"{}"#, r#"{"tripId":""}"#, r#"{"tripId":null,"members":[]}"#] {
        let (status, body) = send(&app, post(payload, "application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "POST {payload}");
        assert_eq!(body, json!({ "error": "Missing tripId" }));
    }
}

#[tokio::test]
async fn unparsable_body_is_an_internal_error() {
    let (app, store) = app();
    for payload in ["not json", "[1,2,3]", r#"{"tripId": 42}"#] {
        let (status, body) = send(&app, post(payload, "application/json")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "POST {payload}");
        assert!(body["error"].as_str().is_some());
    }
    assert!(store.history("42").await.unwrap().is_empty());
}

#[tokio::test]
async fn plain_text_bodies_are_accepted() {
    let (app, store) = app();
    let (status, body) = send(
        &app,
        post(r#"{"tripId":"t2","action":"auto"}"#, "text/plain;charset=utf-8"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let history = store.history("t2").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "auto");
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}
