//! Exchange-assigned instrument codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a KRX short code (e.g. `005930`).
const CODE_LEN: usize = 6;

/// A six character KRX short code such as `005930` or `0000J0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentCode(String);

/// Rejected instrument code.
#[derive(Debug, Clone, Error)]
#[error("invalid instrument code '{0}': expected 6 ASCII letters or digits")]
pub struct InvalidInstrumentCode(pub String);

impl InstrumentCode {
    pub fn new(code: impl Into<String>) -> Result<Self, InvalidInstrumentCode> {
        let code = code.into().trim().to_ascii_uppercase();
        if code.len() == CODE_LEN && code.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(code))
        } else {
            Err(InvalidInstrumentCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstrumentCode {
    type Err = InvalidInstrumentCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstrumentCode {
    type Error = InvalidInstrumentCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstrumentCode> for String {
    fn from(code: InstrumentCode) -> Self {
        code.0
    }
}
