use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::SessionId;

/// What the secondary device is expected to upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    StudentId,
    Selfie,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentId => "studentId",
            Self::Selfie => "selfie",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session lifecycle state.
///
/// Stored records are only ever `Pending` or `Uploaded`. `Expired` is what
/// `UploadSession::status_at` reports once the deadline has passed; the
/// registry evicts such records instead of handing them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Uploaded,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploaded => "uploaded",
            Self::Expired => "expired",
        }
    }
}

/// One outstanding cross-device upload handoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: SessionId,
    pub user_id: i64,
    pub kind: SessionKind,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UploadSession {
    pub(crate) fn pending(
        id: SessionId,
        user_id: i64,
        kind: SessionKind,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            kind,
            status: SessionStatus::Pending,
            uploaded_image_url: None,
            created_at,
            expires_at,
        }
    }

    /// Expired once `now` reaches `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status as observed at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.is_expired_at(now) {
            SessionStatus::Expired
        } else {
            self.status
        }
    }

    /// Whole seconds left before expiry, 0 once expired
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    pub fn is_uploaded(&self) -> bool {
        self.status == SessionStatus::Uploaded
    }
}
