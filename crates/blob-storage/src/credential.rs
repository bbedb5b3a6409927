//! Bearer-token passthrough credentials.
//!
//! A caller's `Authorization` header is turned into a [`StaticTokenCredential`] that always hands
//! out the same token. The expiry attached to it is synthetic (`now + 1h` at creation) and is
//! never checked against the real token's own expiry; the credential must not outlive the
//! request it was built for.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

const BEARER_PREFIX: &str = "Bearer ";

/// Lifetime (seconds) stamped on delegated tokens. Not derived from the token itself.
pub const SYNTHETIC_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Strip a case-insensitive `Bearer ` prefix and surrounding whitespace.
///
/// Values without the prefix are returned trimmed but otherwise unchanged. The prefix is
/// stripped once, so this is idempotent only for tokens that do not themselves start with
/// `Bearer `: `"Bearer Bearer x"` becomes `"Bearer x"`, and a second pass gives `"x"`.
#[must_use]
pub fn normalize_bearer(raw: &str) -> &str {
    let value = raw.trim_start();
    match value.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            value[BEARER_PREFIX.len()..].trim()
        }
        _ => value.trim(),
    }
}

/// Whether the raw header value uses the `Bearer` scheme.
#[must_use]
pub fn has_bearer_scheme(raw: &str) -> bool {
    raw.trim_start()
        .get(..BEARER_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(BEARER_PREFIX))
}

/// A token value plus the instant it is considered expired.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// The raw token. Treat as a secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for downstream storage calls.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Produce the token to present to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if no token can be produced.
    async fn get_token(&self) -> Result<AccessToken>;
}

/// A credential that always returns the token it was built with. It never refreshes.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    #[must_use]
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// Build a credential from a raw `Authorization` header value.
    ///
    /// The token is normalized with [`normalize_bearer`] and stamped with
    /// [`SYNTHETIC_TOKEN_LIFETIME_SECS`] from now.
    #[must_use]
    pub fn from_authorization_header(raw: &str) -> Self {
        Self::from_authorization_header_at(raw, Utc::now())
    }

    #[must_use]
    pub fn from_authorization_header_at(raw: &str, now: DateTime<Utc>) -> Self {
        Self::new(AccessToken::new(
            normalize_bearer(raw),
            now + Duration::seconds(SYNTHETIC_TOKEN_LIFETIME_SECS),
        ))
    }

    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &self.token)
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}
