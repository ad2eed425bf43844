//! In-memory store for QR upload handoff sessions
//!
//! A primary device opens a session and shows its id as a QR code; a
//! secondary device scans it and uploads an image; the primary device polls
//! until the upload lands. This crate provides:
//! - `SessionRegistry`: the keyed session map with lazy expiry
//! - `Sweeper`: background task that evicts abandoned sessions
//! - `Clock` / `IdGenerator`: seams for time and id generation

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod metrics;
pub mod registry;
pub mod session;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use error::SessionError;
pub use id::{IdGenerator, RandomIdGenerator, SessionId};
pub use metrics::RegistryStats;
pub use registry::SessionRegistry;
pub use session::{SessionKind, SessionStatus, UploadSession};
pub use sweeper::{Sweeper, SweeperHandle, MAX_SWEEP_PERIOD};
