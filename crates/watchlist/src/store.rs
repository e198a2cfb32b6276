//! Whole-document JSON persistence for the watchlist.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use common::write_json_atomic;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::watchlist::{Watchlist, WATCHLIST_VERSION};

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Reads and writes the watchlist state file.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file yields [`Watchlist::default`].
    ///
    /// A file that exists but cannot be parsed, carries an unknown version or
    /// holds an invalid config is an error; it is never silently replaced.
    pub fn load(&self) -> Result<Watchlist, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file, starting with default watchlist");
                return Ok(Watchlist::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let probe: VersionProbe = serde_json::from_str(&raw).map_err(|source| self.malformed(source))?;
        if probe.version != WATCHLIST_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: probe.version,
            });
        }

        let mut watchlist: Watchlist =
            serde_json::from_str(&raw).map_err(|source| self.malformed(source))?;
        watchlist.normalize();

        for (code, config) in watchlist.configs() {
            config
                .validate()
                .map_err(|source| StoreError::InvalidConfig {
                    path: self.path.clone(),
                    code: code.clone(),
                    source,
                })?;
        }

        debug!(path = %self.path.display(), instruments = watchlist.len(), "Loaded watchlist");
        Ok(watchlist)
    }

    /// Overwrite the document. Written to a temp file and renamed.
    pub fn save(&self, watchlist: &Watchlist) -> Result<(), StoreError> {
        write_json_atomic(&self.path, watchlist).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), instruments = watchlist.len(), "Saved watchlist");
        Ok(())
    }

    fn malformed(&self, source: serde_json::Error) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            source,
        }
    }
}
