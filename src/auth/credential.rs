// Bearer credential handling

use axum::http::{header::AUTHORIZATION, HeaderMap};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 fingerprint of a bearer token (64-character hex string).
///
/// Audit records carry this instead of the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    pub fn of(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 16 hex chars are enough to correlate log lines
        write!(f, "{}", &self.0[..16])
    }
}

/// Bearer token with redacted formatting
pub struct BearerToken(Secret<String>);

impl BearerToken {
    pub fn new(token: &str) -> Self {
        Self(Secret::new(token.to_string()))
    }

    /// Parse an `Authorization: Bearer <token>` header.
    ///
    /// Returns `None` when the header is absent, not UTF-8, uses another scheme
    /// or carries an empty token.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self::new(token))
    }

    pub fn fingerprint(&self) -> CredentialFingerprint {
        CredentialFingerprint::of(self.expose_secret())
    }

    /// Expose the raw token (use with caution)
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"<REDACTED>")
            .finish()
    }
}
