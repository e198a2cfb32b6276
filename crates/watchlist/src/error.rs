use std::path::PathBuf;

use model::InstrumentCode;
use strategy_core::ConfigError;
use thiserror::Error;

/// Rejected watchlist mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WatchlistError {
    #[error("{0} is not on the watchlist")]
    NotWatched(InstrumentCode),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Failure to read or write the state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state file {path} has unsupported version {found}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("state file {path} has an invalid config for {code}: {source}")]
    InvalidConfig {
        path: PathBuf,
        code: InstrumentCode,
        #[source]
        source: ConfigError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
