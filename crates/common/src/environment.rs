//! KIS environment configuration.
//!
//! Supports the real-money and the virtual (paper) trading environments.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// KIS Open API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum KisEnvironment {
    /// Real trading (real money).
    Real,
    /// Virtual trading (paper account hosted by KIS).
    #[default]
    Virtual,
}

impl KisEnvironment {
    /// REST API base URL.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Real => "https://openapi.koreainvestment.com:9443",
            Self::Virtual => "https://openapivts.koreainvestment.com:29443",
        }
    }

    /// Leading character of trading transaction ids (`TTTC0802U` vs `VTTC0802U`).
    pub fn order_tr_prefix(&self) -> char {
        match self {
            Self::Real => 'T',
            Self::Virtual => 'V',
        }
    }
}

impl fmt::Display for KisEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Virtual => write!(f, "virtual"),
        }
    }
}

impl FromStr for KisEnvironment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "real" | "production" | "prod" | "live" => Ok(Self::Real),
            "virtual" | "paper" | "vts" | "mock" => Ok(Self::Virtual),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

impl TryFrom<String> for KisEnvironment {
    type Error = ParseEnvironmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error parsing environment string.
#[derive(Debug, Clone)]
pub struct ParseEnvironmentError(String);

impl fmt::Display for ParseEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid environment '{}', expected 'real' or 'virtual'",
            self.0
        )
    }
}

impl std::error::Error for ParseEnvironmentError {}
