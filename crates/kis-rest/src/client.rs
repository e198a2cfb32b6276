//! KIS REST API client.

use std::time::Duration;

use async_trait::async_trait;
use auth::{AccessToken, ApiCredentials, AuthError};
use chrono::{NaiveDate, Utc};
use common::{AccountConfig, KisEnvironment};
use model::{InstrumentCode, OrderOutcome, OrderSide, PriceBar, Quote};
use rest_client::{RestClient, RestError};
use strategy_core::{
    Authenticator, InstrumentDirectory, MarketDataGateway, OrderError, OrderGateway, QuoteError,
};

use crate::error::KisRestError;
use crate::responses::{
    ApiResponse, DailyChartResponse, OrderCashRequest, OrderOutput, PriceOutput, StockInfoOutput,
    TokenRequest, TokenResponse,
};

/// Request timeout for KIS API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_PATH: &str = "/oauth2/tokenP";
const PRICE_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-price";
const DAILY_CHART_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice";
const STOCK_INFO_PATH: &str = "/uapi/domestic-stock/v1/quotations/search-stock-info";
const ORDER_CASH_PATH: &str = "/uapi/domestic-stock/v1/trading/order-cash";

const TR_PRICE: &str = "FHKST01010100";
const TR_DAILY_CHART: &str = "FHKST03010100";
const TR_STOCK_INFO: &str = "CTPF1002R";

/// Market division code for KRX stocks.
const MARKET_DIV_STOCK: &str = "J";
/// Product type code for domestic stocks in search-stock-info.
const PRODUCT_TYPE_STOCK: &str = "300";
/// Order division for market orders.
const ORD_DVSN_MARKET: &str = "01";

/// KIS REST API client for domestic stocks.
pub struct KisRestClient {
    client: RestClient,
    credentials: ApiCredentials,
    environment: KisEnvironment,
    account: Option<AccountConfig>,
}

impl KisRestClient {
    /// Create a client for the given environment.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        credentials: ApiCredentials,
        environment: KisEnvironment,
    ) -> Result<Self, KisRestError> {
        Self::with_base_url(credentials, environment, environment.rest_base_url())
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(
        credentials: ApiCredentials,
        environment: KisEnvironment,
        base_url: &str,
    ) -> Result<Self, KisRestError> {
        let client = RestClient::new(base_url, REQUEST_TIMEOUT)?;

        Ok(Self {
            client,
            credentials,
            environment,
            account: None,
        })
    }

    /// Attach the brokerage account orders are placed against.
    pub fn with_account(mut self, account: AccountConfig) -> Self {
        self.account = Some(account);
        self
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Transaction id for a cash order on this environment.
    ///
    /// `TTTC0802U` buys and `TTTC0801U` sells; the virtual environment
    /// replaces the leading `T` with `V`.
    pub fn order_tr_id(&self, side: OrderSide) -> String {
        let suffix = match side {
            OrderSide::Buy => "TTC0802U",
            OrderSide::Sell => "TTC0801U",
        };
        format!("{}{}", self.environment.order_tr_prefix(), suffix)
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Issue a new access token.
    ///
    /// POST /oauth2/tokenP
    pub async fn issue_token(&self) -> Result<AccessToken, KisRestError> {
        let body = TokenRequest {
            grant_type: "client_credentials",
            appkey: self.credentials.app_key(),
            appsecret: self.credentials.expose_secret(),
        };

        tracing::info!(environment = %self.environment, "Requesting access token");

        let response: TokenResponse = self.client.post_json(TOKEN_PATH, &body, &[]).await?;
        if response.access_token.trim().is_empty() {
            return Err(KisRestError::Parse("empty access_token".to_string()));
        }

        tracing::info!(
            expires_in = ?response.expires_in,
            "Access token issued"
        );

        Ok(AccessToken::new(response.access_token, Utc::now()))
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Current price of one instrument.
    ///
    /// GET /uapi/domestic-stock/v1/quotations/inquire-price
    pub async fn inquire_price(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Quote, KisRestError> {
        let query = [
            ("fid_cond_mrkt_div_code", MARKET_DIV_STOCK),
            ("fid_input_iscd", code.as_str()),
        ];
        let bearer = token.bearer();
        let headers = self.headers(&bearer, TR_PRICE);

        let response: ApiResponse<PriceOutput> =
            self.client.get(PRICE_PATH, &query, &headers).await?;
        let quote = response.into_output()?.to_quote()?;

        tracing::debug!(
            code = %code,
            last = %quote.last_price,
            reference = %quote.reference_price,
            "Quote received"
        );

        Ok(quote)
    }

    /// Daily bars (adjusted prices) for `[from, to]`, ascending by date.
    ///
    /// GET /uapi/domestic-stock/v1/quotations/inquire-daily-itemchartprice
    pub async fn inquire_daily_chart(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, KisRestError> {
        let from = from.format("%Y%m%d").to_string();
        let to = to.format("%Y%m%d").to_string();
        let query = [
            ("FID_COND_MRKT_DIV_CODE", MARKET_DIV_STOCK),
            ("FID_INPUT_ISCD", code.as_str()),
            ("FID_INPUT_DATE_1", from.as_str()),
            ("FID_INPUT_DATE_2", to.as_str()),
            ("FID_PERIOD_DIV_CODE", "D"),
            // 0 = adjusted prices
            ("FID_ORG_ADJ_PRC", "0"),
        ];
        let bearer = token.bearer();
        let headers = self.headers(&bearer, TR_DAILY_CHART);

        let response: DailyChartResponse =
            self.client.get(DAILY_CHART_PATH, &query, &headers).await?;
        let bars = response.into_bars()?;

        tracing::debug!(code = %code, bars = bars.len(), "Daily bars received");
        Ok(bars)
    }

    /// Display name of an instrument, `None` if KIS has none.
    ///
    /// GET /uapi/domestic-stock/v1/quotations/search-stock-info
    pub async fn search_stock_info(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Option<String>, KisRestError> {
        let query = [("PRDT_TYPE_CD", PRODUCT_TYPE_STOCK), ("PDNO", code.as_str())];
        let bearer = token.bearer();
        let headers = self.headers(&bearer, TR_STOCK_INFO);

        let response: ApiResponse<StockInfoOutput> =
            self.client.get(STOCK_INFO_PATH, &query, &headers).await?;
        Ok(response.into_output()?.display_name())
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Place a market order for `quantity` shares.
    ///
    /// POST /uapi/domestic-stock/v1/trading/order-cash
    ///
    /// A refusal by KIS (`rt_cd != "0"`) is `OrderOutcome::Rejected`, not an error.
    pub async fn order_cash(
        &self,
        token: &AccessToken,
        account: &AccountConfig,
        code: &InstrumentCode,
        quantity: u32,
        side: OrderSide,
    ) -> Result<OrderOutcome, KisRestError> {
        let body = OrderCashRequest {
            cano: &account.number,
            acnt_prdt_cd: &account.product_code,
            pdno: code.as_str(),
            ord_dvsn: ORD_DVSN_MARKET,
            ord_qty: quantity.to_string(),
            ord_unpr: "0",
        };
        let tr_id = self.order_tr_id(side);
        let bearer = token.bearer();
        let headers = self.headers(&bearer, &tr_id);

        tracing::info!(
            code = %code,
            side = %side,
            quantity = quantity,
            tr_id = %tr_id,
            "Placing market order"
        );

        let response: ApiResponse<OrderOutput> =
            match self.client.post_json(ORDER_CASH_PATH, &body, &headers).await {
                Ok(response) => response,
                Err(RestError::HttpError { status, message }) => {
                    // KIS reports some refusals with a non-2xx status and the usual envelope.
                    match serde_json::from_str::<ApiResponse<serde_json::Value>>(&message) {
                        Ok(envelope) if !envelope.is_ok() => {
                            return Ok(rejected(code, side, envelope.msg1));
                        }
                        _ => return Err(RestError::HttpError { status, message }.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            };

        if !response.is_ok() {
            return Ok(rejected(code, side, response.msg1));
        }

        let output = response.into_output()?;
        tracing::info!(code = %code, side = %side, order_id = %output.odno, "Order accepted");

        Ok(OrderOutcome::Filled {
            order_id: output.odno,
        })
    }

    fn headers<'a>(&'a self, bearer: &'a str, tr_id: &'a str) -> [(&'a str, &'a str); 6] {
        [
            ("content-type", "application/json; charset=utf-8"),
            ("authorization", bearer),
            ("appkey", self.credentials.app_key()),
            ("appsecret", self.credentials.expose_secret()),
            ("tr_id", tr_id),
            ("custtype", "P"),
        ]
    }
}

fn rejected(code: &InstrumentCode, side: OrderSide, msg1: String) -> OrderOutcome {
    let reason = msg1.trim().to_string();
    tracing::warn!(code = %code, side = %side, reason = %reason, "Order rejected");
    OrderOutcome::Rejected { reason }
}

#[async_trait]
impl Authenticator for KisRestClient {
    async fn authenticate(&self) -> Result<AccessToken, AuthError> {
        self.issue_token().await.map_err(AuthError::from)
    }
}

#[async_trait]
impl MarketDataGateway for KisRestClient {
    async fn current_price(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Quote, QuoteError> {
        self.inquire_price(token, code).await.map_err(QuoteError::from)
    }

    async fn daily_bars(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, QuoteError> {
        self.inquire_daily_chart(token, code, from, to)
            .await
            .map_err(QuoteError::from)
    }
}

#[async_trait]
impl InstrumentDirectory for KisRestClient {
    async fn lookup_name(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Option<String>, QuoteError> {
        self.search_stock_info(token, code)
            .await
            .map_err(QuoteError::from)
    }
}

#[async_trait]
impl OrderGateway for KisRestClient {
    async fn submit_market_order(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
        quantity: u32,
        side: OrderSide,
    ) -> Result<OrderOutcome, OrderError> {
        let account = self.account.as_ref().ok_or(OrderError::NoAccount)?;
        self.order_cash(token, account, code, quantity, side)
            .await
            .map_err(OrderError::from)
    }
}

impl std::fmt::Debug for KisRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KisRestClient")
            .field("environment", &self.environment)
            .field("base_url", &self.client.base_url())
            .field("app_key", &self.credentials.app_key())
            .field("account", &self.account.as_ref().map(|a| &a.number))
            .finish()
    }
}
