use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::SessionError;
use crate::id::{IdGenerator, RandomIdGenerator, SessionId};
use crate::metrics::{Metrics, RegistryStats};
use crate::session::{SessionKind, SessionStatus, UploadSession};

/// Keyed registry of QR upload sessions.
///
/// One mutex guards the whole map; every operation is a short critical
/// section with no I/O. Expiry is checked on access (lazy expiry), so
/// correctness never depends on the sweeper having run. The sweeper only
/// bounds memory held by sessions nobody looks up again.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, UploadSession>>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    metrics: Metrics,
    cfg: StoreConfig,
}

impl SessionRegistry {
    pub fn new(cfg: StoreConfig) -> Self {
        Self::with_parts(cfg, Arc::new(SystemClock), Box::new(RandomIdGenerator))
    }

    pub fn with_clock(cfg: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(cfg, clock, Box::new(RandomIdGenerator))
    }

    pub fn with_parts(
        cfg: StoreConfig,
        clock: Arc<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ids,
            metrics: Metrics::new(),
            cfg,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// Current time as seen by this registry's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a new pending session and return its id.
    ///
    /// A generated id that collides with a live session is discarded and
    /// regenerated, up to `id_retry_limit` attempts. A collision with an
    /// expired, not yet swept session reclaims that slot.
    pub fn create(
        &self,
        user_id: i64,
        kind: SessionKind,
        ttl: Duration,
    ) -> Result<SessionId, SessionError> {
        let ttl = self.validate_ttl(ttl)?;

        let mut sessions = self.sessions.lock();
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| SessionError::InvalidTtl("expiry is out of range".to_string()))?;

        let attempts = self.cfg.id_retry_limit.max(1);
        for _ in 0..attempts {
            let id = self.ids.generate();

            match sessions.get(&id).map(|s| s.is_expired_at(now)) {
                Some(false) => continue,
                Some(true) => self.metrics.inc_expired_on_access(),
                None => {}
            }

            let session = UploadSession::pending(id.clone(), user_id, kind, now, expires_at);
            sessions.insert(id.clone(), session);
            self.metrics.inc_created();
            return Ok(id);
        }

        Err(SessionError::AllocationExhausted { attempts })
    }

    /// Look up a live session. Expired sessions are evicted and reported absent.
    pub fn get(&self, id: &str) -> Option<UploadSession> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();

        if !self.retain_if_live(&mut sessions, id, now) {
            return None;
        }
        sessions.get(id).cloned()
    }

    /// Record the upload for a pending session and return the updated record.
    ///
    /// A session that already holds an upload is left untouched.
    pub fn mark_uploaded(
        &self,
        id: &str,
        image_url: impl Into<String>,
    ) -> Result<UploadSession, SessionError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();

        if !self.retain_if_live(&mut sessions, id, now) {
            return Err(SessionError::NotFound(SessionId::from(id)));
        }
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(SessionId::from(id)))?;

        if session.is_uploaded() {
            return Err(SessionError::AlreadyUploaded(session.id.clone()));
        }

        session.status = SessionStatus::Uploaded;
        session.uploaded_image_url = Some(image_url.into());
        self.metrics.inc_uploaded();
        Ok(session.clone())
    }

    /// Delete a session if present. Idempotent.
    pub fn remove(&self, id: &str) {
        let now = self.clock.now();
        let Some(session) = self.sessions.lock().remove(id) else {
            return;
        };

        if session.is_expired_at(now) {
            self.metrics.inc_expired_on_access();
        } else {
            self.metrics.inc_consumed();
        }
    }

    /// Remove and return a live session in one step
    pub fn take(&self, id: &str) -> Option<UploadSession> {
        let now = self.clock.now();
        let session = self.sessions.lock().remove(id)?;

        if session.is_expired_at(now) {
            self.metrics.inc_expired_on_access();
            return None;
        }
        self.metrics.inc_consumed();
        Some(session)
    }

    /// Evict every session expired as of now. Returns the number removed.
    ///
    /// Scans once under the lock, then deletes in batches of
    /// `sweep_batch_size`, reacquiring the lock per batch.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();

        let expired: Vec<SessionId> = {
            let sessions = self.sessions.lock();
            sessions
                .iter()
                .filter(|(_, s)| s.is_expired_at(now))
                .map(|(id, _)| id.clone())
                .collect()
        };
        if expired.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for batch in expired.chunks(self.cfg.sweep_batch_size.max(1)) {
            let mut sessions = self.sessions.lock();
            for id in batch {
                // Recheck: the slot may have been consumed or reclaimed since the scan
                if sessions.get(id).is_some_and(|s| s.is_expired_at(now)) {
                    sessions.remove(id);
                    removed += 1;
                }
            }
        }

        self.metrics.inc_swept(removed as u64);
        removed
    }

    /// Raw entry count, including expired entries not yet evicted
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Entries that have not expired yet. Walks the whole map.
    pub fn live_len(&self) -> usize {
        let now = self.clock.now();
        self.sessions
            .lock()
            .values()
            .filter(|s| !s.is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let now = self.clock.now();
        let sessions = self.sessions.lock();
        let live = sessions.values().filter(|s| !s.is_expired_at(now)).count();
        self.metrics.snapshot(sessions.len(), live)
    }

    fn validate_ttl(&self, ttl: Duration) -> Result<chrono::Duration, SessionError> {
        if ttl.is_zero() {
            return Err(SessionError::InvalidTtl(
                "ttl must be greater than zero".to_string(),
            ));
        }
        if ttl > self.cfg.max_ttl {
            return Err(SessionError::InvalidTtl(format!(
                "{}s exceeds maximum of {}s",
                ttl.as_secs(),
                self.cfg.max_ttl.as_secs()
            )));
        }
        chrono::Duration::from_std(ttl).map_err(|e| SessionError::InvalidTtl(e.to_string()))
    }

    /// True when `id` maps to a live session. Drops it first if it has expired.
    fn retain_if_live(
        &self,
        sessions: &mut HashMap<SessionId, UploadSession>,
        id: &str,
        now: DateTime<Utc>,
    ) -> bool {
        match sessions.get(id).map(|s| s.is_expired_at(now)) {
            None => false,
            Some(true) => {
                sessions.remove(id);
                self.metrics.inc_expired_on_access();
                false
            }
            Some(false) => true,
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
