use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers::{health, qr_session};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/api/qr-sessions", post(qr_session::create_session))
        .route(
            "/api/qr-sessions/{id}",
            get(qr_session::poll_session).delete(qr_session::consume_session),
        )
        .route(
            "/api/qr-sessions/{id}/upload-target",
            get(qr_session::upload_target),
        )
        .route(
            "/api/qr-sessions/{id}/upload",
            post(qr_session::complete_upload),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(session_routes)
        .with_state(state)
        // The QR landing page is served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
