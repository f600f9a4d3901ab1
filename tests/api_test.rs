// tests/api_test.rs — Integration test: HTTP routes via tower oneshot

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use talkart::api::{build_router, ApiState};
use talkart::art::placeholder::{placeholder_data_url, PlaceholderProvider};
use talkart::art::ArtGenerator;
use talkart::infra::config::Config;
use talkart::session::SessionManager;
use talkart::store::images::ImageStore;
use talkart::store::{self, spawn_store_server};

const TOKEN: &str = "festival-admin";

fn app(tmp: &TempDir, token: Option<&str>) -> Router {
    let mut config = Config::default();
    config.server.token = token.map(str::to_string);
    config.server.public_base_url = "https://talkart.example".into();

    let (handle, _task) = spawn_store_server(store::in_memory().unwrap());
    let generator = ArtGenerator::new(Arc::new(PlaceholderProvider), "watercolor", Duration::from_secs(5));
    let images = ImageStore::new(tmp.path().join("images"), 1024 * 1024);
    let state = ApiState::new(&config, handle, generator, images, SessionManager::in_memory(50));
    build_router(state, &config.server.cors_origins)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body, token).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn artwork_body(id: &str) -> Value {
    json!({
        "id": id,
        "sessionId": "session_1_abcdefghi",
        "imageUrl": placeholder_data_url(),
        "prompt": "fireworks over the river",
        "themes": ["夏祭り"],
    })
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);
    let (status, body) = send_json(&app, Method::GET, "/api/talkart/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "placeholder");
}

#[tokio::test]
async fn test_unsupported_method() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);
    let (status, _) = send(&app, Method::DELETE, "/api/talkart/health", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_generate() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);

    let (status, body) = send_json(&app, Method::POST, "/api/talkart/generate", Some(json!({"prompt": "x"})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt and sessionId are required");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/talkart/generate",
        Some(json!({"prompt": "lanterns", "sessionId": "s1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["imageUrl"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));
    assert_eq!(body["prompt"], "lanterns");
    assert_eq!(body["metadata"]["sessionId"], "s1");
    assert_eq!(body["metadata"]["style"], "watercolor");
    assert_eq!(body["metadata"]["demo"], true);
}

#[tokio::test]
async fn test_gallery_add_list_and_dedupe() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, Some(TOKEN));

    let (status, _) = send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("a1")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("a1")), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "a1");

    let (status, _) = send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("a1")), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, Method::GET, "/api/talkart/gallery?limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["artworks"][0]["prompt"], "fireworks over the river");
}

#[tokio::test]
async fn test_artwork_lookup_like_and_feature() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, Some(TOKEN));
    let (_, created) = send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("a2")), Some(TOKEN)).await;
    let code = created["data"]["share_code"].as_str().unwrap().to_string();

    let (status, body) = send_json(&app, Method::GET, &format!("/api/talkart/artwork/{code}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "a2");
    assert_eq!(body["data"]["view_count"], 1);

    let (status, _) = send_json(&app, Method::GET, "/api/talkart/artwork/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_json(&app, Method::POST, "/api/talkart/artwork/a2/like", None, None).await;
    assert_eq!(body["data"]["likes"], 1);

    let featured = Some(json!({"featured": true}));
    let (status, _) = send_json(&app, Method::PUT, "/api/talkart/artwork/a2/featured", featured.clone(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send_json(&app, Method::PUT, "/api/talkart/artwork/a2/featured", featured, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["featured"], true);

    let (_, stats) = send_json(&app, Method::GET, "/api/talkart/gallery/stats", None, None).await;
    assert_eq!(stats["data"]["total"], 1);
    assert_eq!(stats["data"]["featured"], 1);
    assert_eq!(stats["data"]["total_likes"], 1);

    let (status, _) = send_json(&app, Method::DELETE, "/api/talkart/artwork/a2", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&app, Method::DELETE, "/api/talkart/artwork/a2", None, Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_board_places_every_artwork() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);
    for i in 0..3 {
        send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body(&format!("b{i}"))), None).await;
    }

    let (status, body) = send_json(&app, Method::GET, "/api/talkart/gallery/board?width=1200&height=800", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["width"], 1200.0);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    for item in items {
        let rotation = item["position"]["rotation"].as_f64().unwrap();
        assert!((-15.0..=15.0).contains(&rotation));
        assert!(item["position"]["decorationType"].is_string());
    }
}

#[tokio::test]
async fn test_board_dimensions_are_bounded() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);
    send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("big")), None).await;

    let (status, _) = send_json(&app, Method::GET, "/api/talkart/gallery/board?width=inf", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send_json(&app, Method::GET, "/api/talkart/gallery/board?height=NaN", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, Method::GET, "/api/talkart/gallery/board?width=1e9&height=800", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["width"], 10000.0);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_image_and_share_page() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);
    send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("img1")), None).await;

    let resp = app
        .clone()
        .oneshot(Request::get("/api/talkart/image/img1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");

    let (status, html) = send(&app, Method::GET, "/api/talkart/share/img1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("https://talkart.example/api/talkart/image/img1"));
    assert!(html.contains("あなたも作ってみる"));

    let (status, _) = send(&app, Method::GET, "/api/talkart/share/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_proxy_image() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);

    let (status, body) = send_json(&app, Method::POST, "/api/talkart/proxy-image", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Image URL is required");

    let url = placeholder_data_url();
    let (status, body) = send_json(&app, Method::POST, "/api/talkart/proxy-image", Some(json!({"imageUrl": url})), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dataUrl"], url);
    assert_eq!(body["contentType"], "image/svg+xml");
    assert!(body["size"].as_u64().unwrap() > 0);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/talkart/proxy-image",
        Some(json!({"imageUrl": "file:///etc/passwd"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_broadcast_reports_clients() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, Some(TOKEN));
    let (_, created) = send_json(&app, Method::POST, "/api/talkart/gallery", Some(artwork_body("c1")), Some(TOKEN)).await;

    let (status, _) = send_json(&app, Method::POST, "/api/talkart/stream", Some(created["data"].clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, Method::POST, "/api/talkart/stream", Some(created["data"].clone()), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "clients": 0}));
}

#[tokio::test]
async fn test_experience_routes() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, None);

    let (_, snap) = send_json(&app, Method::GET, "/api/talkart/experience", None, None).await;
    assert_eq!(snap["phase"], "start");

    let answer = Some(json!({"answer": "花火と浴衣"}));
    let (status, _) = send_json(&app, Method::POST, "/api/talkart/experience/answer", answer.clone(), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, snap) = send_json(&app, Method::POST, "/api/talkart/experience/start", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["phase"], "questions");
    assert_eq!(snap["question"]["id"], "festival_memory");

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/talkart/experience/answer",
        Some(json!({"answer": "たこ焼き"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, snap) = send_json(&app, Method::POST, "/api/talkart/experience/answer", answer, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["question"]["id"], "favorite_moment");
    assert_eq!(snap["progress"]["question_number"], 2);

    let (_, snap) = send_json(&app, Method::POST, "/api/talkart/experience/reset", None, None).await;
    assert_eq!(snap["phase"], "start");

    let (_, sessions) = send_json(&app, Method::GET, "/api/talkart/sessions", None, None).await;
    assert_eq!(sessions[0]["status"], "error");
    let (_, stats) = send_json(&app, Method::GET, "/api/talkart/sessions/stats", None, None).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["error"], 1);
}
