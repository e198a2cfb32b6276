//! On-disk cache for the single brokerage access token.
//!
//! The token endpoint pushes a notification to the account holder on every
//! call, so a token is reused for as long as it is valid. A broken cache
//! file only ever means "no token": the caller re-authenticates.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use common::write_json_atomic;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::token::{default_token_ttl, AccessToken};

#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    token: String,
    issued_at: DateTime<Utc>,
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
    ttl: Duration,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, default_token_ttl())
    }

    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached token if present and unexpired. Never touches the network.
    pub fn get_valid_token(&self) -> Option<AccessToken> {
        self.get_valid_token_at(Utc::now())
    }

    pub fn get_valid_token_at(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let cached = self.read()?;
        let token = AccessToken::with_ttl(cached.token, cached.issued_at, self.ttl);

        if token.is_usable_at(now) {
            debug!(issued_at = %token.issued_at(), "Using cached access token");
            Some(token)
        } else {
            debug!(issued_at = %token.issued_at(), "Cached access token expired");
            None
        }
    }

    /// Overwrite the cached token. Written to a temp file and renamed.
    pub fn store(&self, token: &str, issued_at: DateTime<Utc>) -> Result<(), AuthError> {
        let cached = CachedToken {
            token: token.to_string(),
            issued_at,
        };
        write_json_atomic(&self.path, &cached).map_err(|source| AuthError::CacheWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), issued_at = %issued_at, "Stored access token");
        Ok(())
    }

    fn read(&self) -> Option<CachedToken> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Token cache unreadable, ignoring");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Token cache corrupt, ignoring");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 15, 0, 0).unwrap()
    }

    fn cache_in(dir: &tempfile::TempDir) -> TokenCache {
        TokenCache::new(dir.path().join("nested").join("token.json"))
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cache_in(&dir).get_valid_token_at(now()).is_none());
    }

    #[test]
    fn test_store_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.store("tok-1", now() - Duration::hours(1)).unwrap();

        let token = cache.get_valid_token_at(now()).unwrap();
        assert_eq!(token.expose(), "tok-1");
        assert_eq!(token.issued_at(), now() - Duration::hours(1));
    }

    #[test]
    fn test_seven_hour_old_token_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.store("stale", now() - Duration::hours(7)).unwrap();

        assert!(cache.get_valid_token_at(now()).is_none());
    }

    #[test]
    fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache.store("old", now() - Duration::hours(7)).unwrap();
        cache.store("new", now()).unwrap();

        assert_eq!(cache.get_valid_token_at(now()).unwrap().expose(), "new");
        assert!(!cache.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), "{ not json").unwrap();

        assert!(cache.get_valid_token_at(now()).is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::with_ttl(dir.path().join("t.json"), Duration::minutes(10));

        cache.store("short", now() - Duration::minutes(11)).unwrap();
        assert!(cache.get_valid_token_at(now()).is_none());
    }
}
