//! Bearer access tokens with a fixed validity window.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Validity window applied to cached tokens (KIS itself issues 24h tokens).
pub const TOKEN_TTL_HOURS: i64 = 6;

/// Default validity window for cached tokens.
pub fn default_token_ttl() -> Duration {
    Duration::hours(TOKEN_TTL_HOURS)
}

/// Pure expiry check: `now - issued_at > ttl`.
pub fn is_expired(issued_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - issued_at > ttl
}

/// An issued bearer token.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    issued_at: DateTime<Utc>,
    ttl: Duration,
}

impl AccessToken {
    /// Token with the default six hour window.
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self::with_ttl(token, issued_at, default_token_ttl())
    }

    pub fn with_ttl(token: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: SecretString::from(token.into()),
            issued_at,
            ttl,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.ttl
    }

    /// Usable iff `now - issued_at < ttl`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at < self.ttl
    }

    /// Raw token value. Never log it.
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Value for the `authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
