use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Random bytes per generated id (hex-encoded to twice this length)
pub const SESSION_ID_BYTES: usize = 16;

/// Opaque session token, safe to embed in a QR code or URL path
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Produces candidate ids. The registry checks candidates for collisions.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> SessionId;
}

/// Thread-local CSPRNG, hex-encoded
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> SessionId {
        let bytes: [u8; SESSION_ID_BYTES] = rand::random();
        SessionId(hex::encode(bytes))
    }
}
