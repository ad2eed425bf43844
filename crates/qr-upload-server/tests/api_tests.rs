//! Integration tests for the QR upload session API.

use axum::http::StatusCode;
use qr_session_store::{ManualClock, SessionRegistry};
use qr_upload_server::{config::Settings, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct TestApp {
    router: axum::Router,
    registry: Arc<SessionRegistry>,
    clock: Arc<ManualClock>,
}

fn test_app() -> TestApp {
    let settings = Settings::default();
    let clock = Arc::new(ManualClock::default());
    let registry = Arc::new(SessionRegistry::with_clock(
        settings.store_config(),
        clock.clone(),
    ));
    let router = qr_upload_server::build_router(AppState::new(registry.clone(), settings));

    TestApp {
        router,
        registry,
        clock,
    }
}

async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, body_json)
}

async fn create_session(app: &TestApp, user_id: i64, kind: &str) -> String {
    let (status, body) = json_request(
        &app.router,
        "POST",
        "/api/qr-sessions",
        Some(json!({ "user_id": user_id, "kind": kind })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_qr_handoff() {
    let app = test_app();

    let (status, created) = json_request(
        &app.router,
        "POST",
        "/api/qr-sessions",
        Some(json!({ "user_id": 42, "kind": "selfie", "ttl_seconds": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["session_id"].as_str().unwrap().to_string();
    assert_eq!(created["kind"], "selfie");
    assert_eq!(created["upload_path"], format!("/api/qr-sessions/{}/upload", id));

    // Primary device polls: still pending
    let poll_uri = format!("/api/qr-sessions/{}?user_id=42", id);
    let (status, polled) = json_request(&app.router, "GET", &poll_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(polled["user_id"], 42);
    assert_eq!(polled["status"], "pending");
    assert_eq!(polled["remaining_seconds"], 120);
    assert!(polled.get("uploaded_image_url").is_none());

    // Secondary device scans the QR code and uploads
    let (status, target) = json_request(
        &app.router,
        "GET",
        &format!("/api/qr-sessions/{}/upload-target", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(target["kind"], "selfie");

    let (status, uploaded) = json_request(
        &app.router,
        "POST",
        &format!("/api/qr-sessions/{}/upload", id),
        Some(json!({ "kind": "selfie", "image_url": "https://x/img.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["status"], "uploaded");
    assert_eq!(uploaded["uploaded_image_url"], "https://x/img.png");

    // Primary device sees the upload and consumes the session
    let (status, polled) = json_request(&app.router, "GET", &poll_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(polled["status"], "uploaded");
    assert_eq!(polled["uploaded_image_url"], "https://x/img.png");

    let (status, consumed) = json_request(&app.router, "DELETE", &poll_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(consumed["uploaded_image_url"], "https://x/img.png");

    let (status, body) = json_request(&app.router, "GET", &poll_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_second_upload_is_conflict() {
    let app = test_app();
    let id = create_session(&app, 1, "studentId").await;
    let upload_uri = format!("/api/qr-sessions/{}/upload", id);

    let (status, _) = json_request(
        &app.router,
        "POST",
        &upload_uri,
        Some(json!({ "kind": "studentId", "image_url": "https://x/first.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = json_request(
        &app.router,
        "POST",
        &upload_uri,
        Some(json!({ "kind": "studentId", "image_url": "https://x/second.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let session = app.registry.get(&id).unwrap();
    assert_eq!(session.uploaded_image_url.as_deref(), Some("https://x/first.png"));

    let (status, _) = json_request(
        &app.router,
        "GET",
        &format!("/api/qr-sessions/{}/upload-target", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upload_with_wrong_kind_rejected() {
    let app = test_app();
    let id = create_session(&app, 1, "studentId").await;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/api/qr-sessions/{}/upload", id),
        Some(json!({ "kind": "selfie", "image_url": "https://x/img.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
    assert!(!app.registry.get(&id).unwrap().is_uploaded());
}

#[tokio::test]
async fn test_upload_with_bad_url_rejected() {
    let app = test_app();
    let id = create_session(&app, 1, "selfie").await;

    for image_url in [
        "ftp://x/img.png",
        "https://exa mple.com/a.png",
        "https://?",
        "https://<script>",
        "https://a:b:c:d",
    ] {
        let (status, body) = json_request(
            &app.router,
            "POST",
            &format!("/api/qr-sessions/{}/upload", id),
            Some(json!({ "kind": "selfie", "image_url": image_url })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", image_url);
        assert_eq!(body["error"], "BadRequest");
    }

    // Nothing was stored
    assert!(!app.registry.get(&id).unwrap().is_uploaded());
}

#[tokio::test]
async fn test_expired_session_is_gone() {
    let app = test_app();
    let id = create_session(&app, 5, "selfie").await;

    app.clock.advance(Duration::from_secs(121));

    let (status, _) = json_request(
        &app.router,
        "POST",
        &format!("/api/qr-sessions/{}/upload", id),
        Some(json!({ "kind": "selfie", "image_url": "https://x/img.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &app.router,
        "GET",
        &format!("/api/qr-sessions/{}?user_id=5", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_other_user_cannot_poll_or_consume() {
    let app = test_app();
    let id = create_session(&app, 1, "selfie").await;
    let uri = format!("/api/qr-sessions/{}?user_id=2", id);

    let (status, body) = json_request(&app.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = json_request(&app.router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.registry.get(&id).is_some());
}

#[tokio::test]
async fn test_poll_requires_user_id() {
    let app = test_app();
    let id = create_session(&app, 1, "selfie").await;

    let (status, _) =
        json_request(&app.router, "GET", &format!("/api/qr-sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_ttl_rejected() {
    let app = test_app();

    for ttl in [0, 16 * 60] {
        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/qr-sessions",
            Some(json!({ "user_id": 1, "kind": "selfie", "ttl_seconds": ttl })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "ttl {}", ttl);
        assert_eq!(body["error"], "BadRequest");
    }
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let app = test_app();

    let (status, _) = json_request(
        &app.router,
        "GET",
        "/api/qr-sessions/deadbeef/upload-target",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &app.router,
        "DELETE",
        "/api/qr-sessions/deadbeef?user_id=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_sessions() {
    let app = test_app();
    create_session(&app, 1, "selfie").await;
    create_session(&app, 2, "studentId").await;

    let (status, body) = json_request(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_sessions"], 2);
    assert_eq!(body["entries"], 2);
    assert_eq!(body["created_total"], 2);
}

#[tokio::test]
async fn test_health_excludes_unswept_expired_sessions() {
    let app = test_app();
    create_session(&app, 1, "selfie").await;
    let (status, _) = json_request(
        &app.router,
        "POST",
        "/api/qr-sessions",
        Some(json!({ "user_id": 2, "kind": "selfie", "ttl_seconds": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    app.clock.advance(Duration::from_secs(31));

    let (status, body) = json_request(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_sessions"], 1);
    assert_eq!(body["entries"], 2);
}
