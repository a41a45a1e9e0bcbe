//! Signed session tokens for the browser cookie.
//!
//! A token is `<session id>.<hex HMAC-SHA256 of the session id>`. Tokens
//! that fail verification are treated as absent; the caller then issues
//! a fresh session.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use kushlbot_types::identity::SessionId;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur while building a signer.
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("session signing key is empty")]
    EmptyKey,

    #[error("invalid session signing key: {0}")]
    InvalidKey(String),
}

/// Signs and verifies session tokens with a server-side key.
///
/// Holds a keyed MAC that is cloned per operation, so the key bytes are
/// not kept around separately.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(key: &SecretString) -> Result<Self, SessionTokenError> {
        let bytes = key.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(SessionTokenError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(bytes)
            .map_err(|e| SessionTokenError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Produce the cookie value for `session`.
    pub fn sign(&self, session: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(session.as_str().as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{}.{}", session.as_str(), hex_encode(&tag))
    }

    /// Return the session id carried by `token` if its signature is valid.
    pub fn verify(&self, token: &str) -> Option<SessionId> {
        let (raw_id, signature_hex) = token.rsplit_once('.')?;
        let expected = hex_decode(signature_hex)?;

        let mut mac = self.mac.clone();
        mac.update(raw_id.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&expected).ok()?;

        SessionId::parse(raw_id)
    }
}

/// Encode bytes to a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex-decode a string to bytes. `None` on odd length or non-hex input.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
