//! KIS (Korea Investment & Securities) Open API client.
//!
//! This crate provides a typed client for the domestic-stock REST endpoints:
//!
//! - **Token issue**: `POST /oauth2/tokenP`
//! - **Quotes**: current price and adjusted daily bars
//! - **Instrument names**: abbreviated product name lookup
//! - **Cash orders**: market buy/sell, real or virtual account
//!
//! `KisRestClient` implements the gateway traits from `strategy-core`, so the
//! session runner never sees KIS wire types.
//!
//! # Example
//!
//! ```rust,ignore
//! use kis_rest::KisRestClient;
//! use strategy_core::MarketDataGateway;
//!
//! let client = KisRestClient::new(credentials, KisEnvironment::Virtual)?
//!     .with_account(account);
//!
//! let token = client.issue_token().await?;
//! let quote = client.current_price(&token, &"005930".parse()?).await?;
//! ```

mod client;
mod error;
mod responses;

pub use client::KisRestClient;
pub use error::KisRestError;
pub use responses::{
    ApiResponse, DailyBarOutput, DailyChartResponse, OrderOutput, PriceOutput, StockInfoOutput,
    TokenResponse,
};
