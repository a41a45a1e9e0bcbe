//! Anonymous per-browser session identity.
//!
//! A `SessionId` scopes ownership of chat sessions. It is not an account:
//! it is minted on a browser's first request, carried in a signed cookie,
//! and passed explicitly into every chat operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for one browser.
///
/// Backed by a random (v4) UUID, so it carries 122 bits of entropy and
/// cannot be derived from timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh, unguessable session identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a previously minted identifier.
    ///
    /// Returns `None` unless `raw` is a hyphenated UUID, which keeps
    /// arbitrary cookie payloads out of SQL parameters and log lines.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
