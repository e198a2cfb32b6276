//! KIS Open API request and response types.
//!
//! KIS sends every number as a string, so conversion into domain types
//! happens here rather than through serde.

use std::str::FromStr;

use chrono::NaiveDate;
use model::{PriceBar, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::KisRestError;

/// `rt_cd` value meaning success.
pub const RT_CD_OK: &str = "0";

/// Body of POST /oauth2/tokenP.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub appkey: &'a str,
    pub appsecret: &'a str,
}

/// Response from POST /oauth2/tokenP.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime granted by KIS, in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Common envelope of the `uapi` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub rt_cd: String,
    #[serde(default)]
    pub msg_cd: String,
    #[serde(default)]
    pub msg1: String,
    pub output: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.rt_cd == RT_CD_OK
    }

    /// The `output` block, or the API error the envelope carries.
    pub fn into_output(self) -> Result<T, KisRestError> {
        if !self.is_ok() {
            return Err(KisRestError::Api {
                code: self.msg_cd,
                message: self.msg1.trim().to_string(),
            });
        }
        self.output
            .ok_or_else(|| KisRestError::Parse("response has no output block".to_string()))
    }
}

/// `output` of inquire-price (FHKST01010100). Only the fields used.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceOutput {
    /// Current price.
    pub stck_prpr: String,
    /// Base price (prior close).
    pub stck_sdpr: String,
    /// Change rate vs. prior close, percent.
    pub prdy_ctrt: String,
}

impl PriceOutput {
    pub fn to_quote(&self) -> Result<Quote, KisRestError> {
        Ok(Quote {
            last_price: parse_decimal("stck_prpr", &self.stck_prpr)?,
            reference_price: parse_decimal("stck_sdpr", &self.stck_sdpr)?,
            change_pct: parse_decimal("prdy_ctrt", &self.prdy_ctrt)?,
        })
    }
}

/// Response from inquire-daily-itemchartprice (FHKST03010100).
#[derive(Debug, Clone, Deserialize)]
pub struct DailyChartResponse {
    pub rt_cd: String,
    #[serde(default)]
    pub msg_cd: String,
    #[serde(default)]
    pub msg1: String,
    #[serde(default)]
    pub output2: Vec<DailyBarOutput>,
}

impl DailyChartResponse {
    /// Bars ascending by date. KIS pads short ranges with empty rows; those are skipped.
    pub fn into_bars(self) -> Result<Vec<PriceBar>, KisRestError> {
        if self.rt_cd != RT_CD_OK {
            return Err(KisRestError::Api {
                code: self.msg_cd,
                message: self.msg1.trim().to_string(),
            });
        }

        let bars = self
            .output2
            .iter()
            .filter(|row| !row.stck_bsop_date.trim().is_empty())
            .map(DailyBarOutput::to_bar)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(model::sort_bars(bars))
    }
}

/// One `output2` row of the daily chart.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBarOutput {
    #[serde(default)]
    pub stck_bsop_date: String,
    #[serde(default)]
    pub stck_oprc: String,
    #[serde(default)]
    pub stck_hgpr: String,
    #[serde(default)]
    pub stck_lwpr: String,
    #[serde(default)]
    pub stck_clpr: String,
    #[serde(default)]
    pub acml_vol: String,
}

impl DailyBarOutput {
    pub fn to_bar(&self) -> Result<PriceBar, KisRestError> {
        let date = NaiveDate::parse_from_str(self.stck_bsop_date.trim(), "%Y%m%d").map_err(|e| {
            KisRestError::Parse(format!("stck_bsop_date '{}': {e}", self.stck_bsop_date))
        })?;
        let volume = self
            .acml_vol
            .trim()
            .parse::<u64>()
            .map_err(|e| KisRestError::Parse(format!("acml_vol '{}': {e}", self.acml_vol)))?;

        Ok(PriceBar {
            date,
            open: parse_decimal("stck_oprc", &self.stck_oprc)?,
            high: parse_decimal("stck_hgpr", &self.stck_hgpr)?,
            low: parse_decimal("stck_lwpr", &self.stck_lwpr)?,
            close: parse_decimal("stck_clpr", &self.stck_clpr)?,
            volume,
        })
    }
}

/// `output` of search-stock-info (CTPF1002R). Only the fields used.
#[derive(Debug, Clone, Deserialize)]
pub struct StockInfoOutput {
    /// Abbreviated product name, e.g. "삼성전자".
    #[serde(default)]
    pub prdt_abrv_name: String,
    #[serde(default)]
    pub prdt_name: String,
}

impl StockInfoOutput {
    /// Short name, falling back to the full name. `None` if both are blank.
    pub fn display_name(&self) -> Option<String> {
        [&self.prdt_abrv_name, &self.prdt_name]
            .into_iter()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Body of POST order-cash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OrderCashRequest<'a> {
    /// Account number, first eight digits.
    pub cano: &'a str,
    /// Account product code, last two digits.
    pub acnt_prdt_cd: &'a str,
    /// Instrument code.
    pub pdno: &'a str,
    /// Order division; `01` is market.
    pub ord_dvsn: &'a str,
    pub ord_qty: String,
    /// Unit price; `0` for market orders.
    pub ord_unpr: &'a str,
}

/// `output` of order-cash.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderOutput {
    #[serde(rename = "KRX_FWDG_ORD_ORGNO", default)]
    pub krx_fwdg_ord_orgno: String,
    /// Order number.
    #[serde(rename = "ODNO")]
    pub odno: String,
    #[serde(rename = "ORD_TMD", default)]
    pub ord_tmd: String,
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, KisRestError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| KisRestError::Parse(format!("{field} '{raw}': {e}")))
}
