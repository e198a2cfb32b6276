//! Layered application configuration.
//!
//! Layers are applied in order, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`kis-trader.toml`, or the path in `KIS_CONFIG`)
//! 3. Environment variables (a `.env` file is loaded first when reading the
//!    process environment)

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::environment::KisEnvironment;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "kis-trader.toml";
/// Default location of the watchlist document.
pub const DEFAULT_STATE_FILE: &str = "data/watchlist.json";
/// Default location of the cached access token.
pub const DEFAULT_TOKEN_FILE: &str = "data/kis_token.json";
/// Default account product code (`01` = regular brokerage account).
pub const DEFAULT_ACCOUNT_PRODUCT: &str = "01";

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent from every layer.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an unusable value.
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Brokerage account the orders are booked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// First 8 digits of the account number (`CANO`).
    pub number: String,
    /// Two-digit product code (`ACNT_PRDT_CD`).
    pub product_code: String,
}

impl AccountConfig {
    /// Parse `12345678-01` or a bare `12345678` (product code defaults to `01`).
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let (number, product_code) = match raw.split_once('-') {
            Some((n, p)) => (n.trim(), p.trim()),
            None => (raw, DEFAULT_ACCOUNT_PRODUCT),
        };

        let valid = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_digit());
        if !valid(number, 8) || !valid(product_code, 2) {
            return Err(ConfigError::Invalid {
                key: "account",
                value: raw.to_string(),
            });
        }

        Ok(Self {
            number: number.to_string(),
            product_code: product_code.to_string(),
        })
    }
}

/// Fully resolved application configuration.
pub struct AppConfig {
    pub environment: KisEnvironment,
    pub app_key: String,
    pub app_secret: SecretString,
    /// Required unless `dry_run` is set.
    pub account: Option<AccountConfig>,
    /// Kakao "memo to me" token; notifications are disabled without it.
    pub kakao_token: Option<SecretString>,
    pub state_file: PathBuf,
    pub token_file: PathBuf,
    /// Simulate fills instead of sending orders to the brokerage.
    pub dry_run: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("app_key", &self.app_key)
            .field("app_secret", &"[REDACTED]")
            .field("account", &self.account)
            .field("kakao_token", &self.kakao_token.as_ref().map(|_| "[REDACTED]"))
            .field("state_file", &self.state_file)
            .field("token_file", &self.token_file)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Shape of the optional TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    environment: Option<KisEnvironment>,
    app_key: Option<String>,
    app_secret: Option<String>,
    account: Option<String>,
    kakao_token: Option<String>,
    state_file: Option<PathBuf>,
    token_file: Option<PathBuf>,
    dry_run: Option<bool>,
}

/// Intermediate, not yet validated settings.
#[derive(Debug)]
struct Layered {
    environment: KisEnvironment,
    app_key: Option<String>,
    app_secret: Option<String>,
    account: Option<String>,
    kakao_token: Option<String>,
    state_file: PathBuf,
    token_file: PathBuf,
    dry_run: bool,
}

impl Default for Layered {
    fn default() -> Self {
        Self {
            environment: KisEnvironment::default(),
            app_key: None,
            app_secret: None,
            account: None,
            kakao_token: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            dry_run: true,
        }
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Builds an [`AppConfig`] from defaults, a TOML file and the environment.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader reading the process environment (and `.env`, if present).
    pub fn from_process_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            file: None,
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Loader with an explicit variable lookup, used by tests.
    pub fn with_env(env: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            file: None,
            env: Box::new(env),
        }
    }

    /// Use this config file instead of the default lookup. The file must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        finish(self.layered()?)
    }

    /// Location of the watchlist document. Credentials are not required.
    pub fn state_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.layered()?.state_file)
    }

    fn layered(&self) -> Result<Layered, ConfigError> {
        let mut layered = Layered::default();

        if let Some(file) = self.read_file()? {
            apply_file(&mut layered, file);
        }
        self.apply_env(&mut layered)?;
        Ok(layered)
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.trim().is_empty())
    }

    fn read_file(&self) -> Result<Option<FileConfig>, ConfigError> {
        let (path, required) = match (&self.file, self.var("KIS_CONFIG")) {
            (Some(path), _) => (path.clone(), true),
            (None, Some(path)) => (PathBuf::from(path), true),
            (None, None) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(None);
        }

        let file = parse_file(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(Some(file))
    }

    fn apply_env(&self, layered: &mut Layered) -> Result<(), ConfigError> {
        if let Some(raw) = self.var("KIS_ENVIRONMENT") {
            layered.environment = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "KIS_ENVIRONMENT",
                value: raw.clone(),
            })?;
        }
        if let Some(v) = self.var("KIS_APP_KEY") {
            layered.app_key = Some(v);
        }
        if let Some(v) = self.var("KIS_APP_SECRET") {
            layered.app_secret = Some(v);
        }
        if let Some(mut v) = self.var("KIS_ACCOUNT_NO") {
            if let Some(product) = self.var("KIS_ACCOUNT_PRODUCT") {
                if !v.contains('-') {
                    v = format!("{v}-{product}");
                }
            }
            layered.account = Some(v);
        }
        if let Some(v) = self.var("KAKAO_TOKEN") {
            layered.kakao_token = Some(v);
        }
        if let Some(v) = self.var("KIS_STATE_FILE") {
            layered.state_file = PathBuf::from(v);
        }
        if let Some(v) = self.var("KIS_TOKEN_FILE") {
            layered.token_file = PathBuf::from(v);
        }
        if let Some(raw) = self.var("KIS_DRY_RUN") {
            layered.dry_run = parse_bool(&raw).ok_or(ConfigError::Invalid {
                key: "KIS_DRY_RUN",
                value: raw,
            })?;
        }
        Ok(())
    }
}

fn parse_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_file(layered: &mut Layered, file: FileConfig) {
    if let Some(v) = file.environment {
        layered.environment = v;
    }
    layered.app_key = file.app_key.or(layered.app_key.take());
    layered.app_secret = file.app_secret.or(layered.app_secret.take());
    layered.account = file.account.or(layered.account.take());
    layered.kakao_token = file.kakao_token.or(layered.kakao_token.take());
    if let Some(v) = file.state_file {
        layered.state_file = v;
    }
    if let Some(v) = file.token_file {
        layered.token_file = v;
    }
    if let Some(v) = file.dry_run {
        layered.dry_run = v;
    }
}

fn finish(layered: Layered) -> Result<AppConfig, ConfigError> {
    let app_key = layered.app_key.ok_or(ConfigError::Missing("KIS_APP_KEY"))?;
    let app_secret = layered
        .app_secret
        .ok_or(ConfigError::Missing("KIS_APP_SECRET"))?;

    let account = layered
        .account
        .as_deref()
        .map(AccountConfig::parse)
        .transpose()?;
    if account.is_none() && !layered.dry_run {
        return Err(ConfigError::Missing("KIS_ACCOUNT_NO"));
    }

    Ok(AppConfig {
        environment: layered.environment,
        app_key,
        app_secret: SecretString::from(app_secret),
        account,
        kakao_token: layered.kakao_token.map(SecretString::from),
        state_file: layered.state_file,
        token_file: layered.token_file,
        dry_run: layered.dry_run,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
