use axum::extract::FromRef;
use qr_session_store::SessionRegistry;
use std::sync::Arc;

use crate::config::Settings;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, settings: Settings) -> Self {
        Self { registry, settings }
    }
}

impl FromRef<AppState> for Arc<SessionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}
