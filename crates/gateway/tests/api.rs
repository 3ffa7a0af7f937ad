//! Router tests against the seeded mock store

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use papertok_common::{
    clock::SystemClock, config::AppConfig, EntityStore, MockDataSource,
};
use papertok_gateway::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let source = MockDataSource::new(EntityStore::seeded(), Arc::new(SystemClock::without_delays()));
    create_router(AppState::new(AppConfig::default(), Arc::new(source)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_mock_mode() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data_mode"], "mock");
}

#[tokio::test]
async fn unknown_user_is_synthesized() {
    let (status, body) = send(&app(), Method::GET, "/users/424242", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "用户424242");
}

#[tokio::test]
async fn follow_round_trip() {
    let app = app();
    let (_, first) = send(&app, Method::POST, "/users/follow/3", None).await;
    let (_, second) = send(&app, Method::POST, "/users/follow/3", None).await;
    assert_eq!(first, json!(true));
    assert_eq!(second, json!(false));

    let (_, following) = send(&app, Method::GET, "/users/is-following/3", None).await;
    assert_eq!(following, json!(true));

    let (_, me) = send(&app, Method::GET, "/users/me", None).await;
    assert_eq!(me["following"], 1);
    assert_eq!(me["followingList"], json!([3]));
}

#[tokio::test]
async fn missing_knowledge_base_is_404_envelope() {
    let (status, body) = send(&app(), Method::GET, "/knowledge-bases/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "KNOWLEDGE_BASE_NOT_FOUND");
}

#[tokio::test]
async fn add_paper_assigns_next_id() {
    let app = app();
    let paper = json!({
        "title": "Scaling Laws",
        "authors": ["Kaplan"],
        "abstract": "",
        "publishDate": "2020"
    });
    let (status, body) = send(&app, Method::POST, "/knowledge-bases/3/papers", Some(paper)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 7);

    let (_, kb) = send(&app, Method::GET, "/knowledge-bases/3", None).await;
    assert_eq!(kb["papers"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn current_user_knowledge_bases_only() {
    let (_, body) = send(&app(), Method::GET, "/knowledge-bases/user/0", None).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|kb| kb["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[tokio::test]
async fn blank_search_finds_nothing() {
    let (status, body) = send(&app(), Method::GET, "/papers/search?q=%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app(), Method::GET, "/papers/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn send_message_then_thread_ends_with_it() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/messages",
        Some(json!({ "receiver_id": 2, "content": "收到" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, thread) = send(&app, Method::GET, "/messages/2", None).await;
    let thread = thread.as_array().unwrap();
    assert_eq!(thread.last().unwrap()["content"], "收到");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/messages",
        Some(json!({ "receiver_id": 2, "content": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn moderation_listing_and_delete() {
    let app = app();
    let (_, pending) = send(&app, Method::GET, "/posts/pending?skip=0&limit=1", None).await;
    assert_eq!(pending["total"], 2);
    assert_eq!(pending["per_page"], 1);
    assert_eq!(pending["total_pages"], 2);

    let (status, _) = send(&app, Method::DELETE, "/posts/4", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/posts/4/comments", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
