use axum::{extract::State, http::StatusCode, Json};
use qr_session_store::SessionRegistry;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    /// Sessions that have not expired
    active_sessions: usize,
    /// Held entries, including expired ones awaiting the sweep
    entries: usize,
    created_total: u64,
    swept_total: u64,
}

pub async fn health_check(
    State(registry): State<Arc<SessionRegistry>>,
) -> (StatusCode, Json<HealthResponse>) {
    let stats = registry.stats();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_sessions: stats.live_entries,
            entries: stats.entries,
            created_total: stats.created_total,
            swept_total: stats.swept_total,
        }),
    )
}
