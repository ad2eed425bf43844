//! HTTP boundary for the QR upload handoff
//!
//! Hosts the three collaborators of a `SessionRegistry`:
//! - initiation: the primary device opens a session and renders its QR code
//! - completion: the secondary device uploads against the scanned session
//! - polling: the primary device waits for the upload, then consumes it

pub mod config;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod state;
pub mod utils;

pub use routes::build_router;
pub use state::AppState;
