//! Session runner: one refresh tick per instrument.

use std::sync::Arc;

use auth::{AccessToken, AuthError, TokenCache};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use model::{InstrumentCode, OrderOutcome, OrderSide, Quote};
use rust_decimal::Decimal;
use strategy_core::{
    Authenticator, DispatchState, InstrumentDirectory, LegOrder, MarketDataGateway,
    NotificationSink, OrderGateway, SignalEvaluator, SignalReport, TriggerEngine, TriggerTargets,
};
use tracing::{debug, info, warn};
use watchlist::{StoreError, WatchlistStore};

use crate::error::TickError;
use crate::session::Session;

/// Calendar days of daily bars fetched for the signal (about 60 sessions).
const HISTORY_DAYS: i64 = 90;

/// The collaborators a tick talks to.
#[derive(Clone)]
pub struct Gateways {
    pub authenticator: Arc<dyn Authenticator>,
    pub market_data: Arc<dyn MarketDataGateway>,
    pub directory: Arc<dyn InstrumentDirectory>,
    pub orders: Arc<dyn OrderGateway>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// What happened to one fired leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegOutcome {
    /// Filled and recorded; `notified` is whether the push went out.
    Filled { order_id: String, notified: bool },
    /// Refused by the brokerage; the leg stays eligible.
    Rejected { reason: String },
    /// Could not be submitted; the leg stays eligible.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegResult {
    pub leg: LegOrder,
    pub outcome: LegOutcome,
}

/// Everything one tick observed and did, for display.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub code: InstrumentCode,
    pub name: String,
    pub trading_date: NaiveDate,
    pub quote: Quote,
    pub targets: TriggerTargets,
    pub armed: bool,
    /// Dispatch state after this tick's orders.
    pub state: DispatchState,
    /// `None` when the bars could not be fetched.
    pub signal: Option<SignalReport>,
    pub legs: Vec<LegResult>,
    /// Non-fatal problems: history, notification, persistence.
    pub warnings: Vec<String>,
}

impl TickReport {
    pub fn filled(&self) -> impl Iterator<Item = &LegResult> {
        self.legs
            .iter()
            .filter(|r| matches!(r.outcome, LegOutcome::Filled { .. }))
    }
}

/// Text pushed after a confirmed fill.
pub fn fill_message(side: OrderSide, name: &str, target: Decimal, price: Decimal) -> String {
    format!("[{side} filled] {name}\ntarget: {target}\nprice: {price}")
}

/// Drives ticks against the collaborators and persists the session.
pub struct SessionRunner {
    gateways: Gateways,
    token_cache: TokenCache,
    store: WatchlistStore,
}

impl SessionRunner {
    pub fn new(gateways: Gateways, token_cache: TokenCache, store: WatchlistStore) -> Self {
        Self {
            gateways,
            token_cache,
            store,
        }
    }

    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    /// A usable token: the session's, else the cache file's, else a fresh one.
    ///
    /// Fresh tokens are written back to the cache. A failed cache write is
    /// logged and otherwise ignored.
    pub async fn ensure_token(&self, session: &mut Session) -> Result<AccessToken, AuthError> {
        self.ensure_token_at(session, Utc::now()).await
    }

    pub async fn ensure_token_at(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        if let Some(token) = session.token().filter(|t| t.is_usable_at(now)) {
            return Ok(token.clone());
        }

        if let Some(token) = self.token_cache.get_valid_token_at(now) {
            session.set_token(token.clone());
            return Ok(token);
        }

        info!("No valid cached token, authenticating");
        let token = self.gateways.authenticator.authenticate().await?;
        if let Err(e) = self.token_cache.store(token.expose(), token.issued_at()) {
            warn!(error = %e, "Failed to cache access token");
        }
        session.set_token(token.clone());
        Ok(token)
    }

    /// Save the watchlist if it has unsaved changes.
    ///
    /// On failure the session stays dirty so the next call retries.
    pub fn persist(&self, session: &mut Session) -> Result<(), StoreError> {
        if !session.is_dirty() {
            return Ok(());
        }
        self.store.save(session.watchlist())?;
        session.mark_clean();
        Ok(())
    }

    /// One refresh of `code` on trading date `today`.
    ///
    /// Token, quote, name, signal, trigger, orders, notification, persist.
    /// Only authentication and quote failures end the tick early.
    pub async fn tick(
        &self,
        session: &mut Session,
        code: &InstrumentCode,
        today: NaiveDate,
    ) -> Result<TickReport, TickError> {
        if !session.watchlist().contains(code) {
            return Err(TickError::NotWatched(code.clone()));
        }
        session.roll_to(today);

        let token = self.ensure_token(session).await?;
        let mut warnings = Vec::new();

        let quote = self
            .gateways
            .market_data
            .current_price(&token, code)
            .await
            .map_err(|source| TickError::Quote {
                code: code.clone(),
                source,
            })?;

        let name = self.resolve_name(session, &token, code).await;

        let signal = match self
            .gateways
            .market_data
            .daily_bars(&token, code, today - Duration::days(HISTORY_DAYS), today)
            .await
        {
            Ok(bars) => Some(SignalEvaluator::analyze(&bars, quote.last_price)),
            Err(e) => {
                warn!(code = %code, error = %e, "Daily bars unavailable, skipping signal");
                warnings.push(format!("signal unavailable: {e}"));
                None
            }
        };

        let config = session
            .watchlist()
            .config(code)
            .cloned()
            .unwrap_or_default();
        let state = session.watchlist().dispatch_state(code, today);
        let decision =
            TriggerEngine::evaluate(&config, quote.last_price, quote.reference_price, &state);

        debug!(
            code = %code,
            price = %quote.last_price,
            buy_target = %decision.targets.buy,
            sell_target = %decision.targets.sell,
            armed = config.armed,
            "Trigger evaluated"
        );

        let mut legs = Vec::new();
        for leg in decision.legs() {
            let outcome = self
                .dispatch(session, &token, code, &name, leg, quote.last_price, today)
                .await;
            if let LegOutcome::Filled { notified: false, .. } = outcome {
                warnings.push(format!("{} fill notification not delivered", leg.side));
            }
            legs.push(LegResult { leg, outcome });
        }

        if let Err(e) = self.persist(session) {
            warn!(error = %e, "Failed to save watchlist, will retry on next change");
            warnings.push(format!("state not saved: {e}"));
        }

        Ok(TickReport {
            code: code.clone(),
            name,
            trading_date: today,
            quote,
            targets: decision.targets,
            armed: config.armed,
            state: session.watchlist().dispatch_state(code, today),
            signal,
            legs,
            warnings,
        })
    }

    /// Tick every watched instrument in watchlist order.
    ///
    /// Stops at the first fatal error; other errors are returned per code.
    pub async fn tick_all(
        &self,
        session: &mut Session,
        today: NaiveDate,
    ) -> Result<Vec<Result<TickReport, TickError>>, TickError> {
        let codes = session.watchlist().codes().to_vec();
        let mut results = Vec::with_capacity(codes.len());

        for code in &codes {
            match self.tick(session, code, today).await {
                Err(e) if e.is_fatal() => return Err(e),
                result => results.push(result),
            }
        }

        Ok(results)
    }

    async fn resolve_name(
        &self,
        session: &mut Session,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> String {
        if let Some(name) = session.watchlist().name(code) {
            return name.to_string();
        }

        match self.gateways.directory.lookup_name(token, code).await {
            Ok(Some(name)) => {
                session.watchlist_mut().set_name(code, name.clone());
                name
            }
            Ok(None) => code.to_string(),
            Err(e) => {
                warn!(code = %code, error = %e, "Name lookup failed, showing code");
                code.to_string()
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        session: &mut Session,
        token: &AccessToken,
        code: &InstrumentCode,
        name: &str,
        leg: LegOrder,
        price: Decimal,
        today: NaiveDate,
    ) -> LegOutcome {
        let submitted = self
            .gateways
            .orders
            .submit_market_order(token, code, leg.quantity, leg.side)
            .await;

        match submitted {
            Ok(OrderOutcome::Filled { order_id }) => {
                session.watchlist_mut().mark_fired(code, today, leg.side);
                info!(
                    code = %code,
                    side = %leg.side,
                    quantity = leg.quantity,
                    target = %leg.target,
                    price = %price,
                    order_id = %order_id,
                    "Order filled"
                );

                let text = fill_message(leg.side, name, leg.target, price);
                let notified = self.gateways.notifier.send(&text).await;
                LegOutcome::Filled { order_id, notified }
            }
            Ok(OrderOutcome::Rejected { reason }) => {
                warn!(code = %code, side = %leg.side, reason = %reason, "Order rejected, will retry next tick");
                LegOutcome::Rejected { reason }
            }
            Err(e) => {
                warn!(code = %code, side = %leg.side, error = %e, "Order submission failed, will retry next tick");
                LegOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::PriceBar;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use strategy_core::{InstrumentConfig, OrderError, QuoteError, SignalLabel, TriggerRule};
    use watchlist::Watchlist;

    #[derive(Default)]
    struct FakeBroker {
        auth_calls: AtomicUsize,
        auth_fails: bool,
        prices: Mutex<VecDeque<Decimal>>,
        quote_fails: bool,
        bars: Vec<PriceBar>,
        name: Option<String>,
        order_replies: Mutex<VecDeque<OrderOutcome>>,
        orders: Mutex<Vec<(OrderSide, u32)>>,
        notify_ok: bool,
        messages: Mutex<Vec<String>>,
    }

    impl FakeBroker {
        fn with_prices(prices: &[Decimal]) -> Self {
            Self {
                prices: Mutex::new(prices.iter().copied().collect()),
                notify_ok: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Authenticator for FakeBroker {
        async fn authenticate(&self) -> Result<AccessToken, AuthError> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            if self.auth_fails {
                return Err(AuthError::Rejected {
                    status: 403,
                    message: "bad appkey".into(),
                });
            }
            Ok(AccessToken::new("fresh", Utc::now()))
        }
    }

    #[async_trait]
    impl MarketDataGateway for FakeBroker {
        async fn current_price(
            &self,
            _token: &AccessToken,
            _code: &InstrumentCode,
        ) -> Result<Quote, QuoteError> {
            if self.quote_fails {
                return Err(QuoteError::Transport("down".into()));
            }
            let mut prices = self.prices.lock().unwrap();
            let last = if prices.len() > 1 {
                prices.pop_front().unwrap()
            } else {
                *prices.front().unwrap()
            };
            Ok(Quote {
                last_price: last,
                reference_price: dec!(70000),
                change_pct: Decimal::ZERO,
            })
        }

        async fn daily_bars(
            &self,
            _token: &AccessToken,
            _code: &InstrumentCode,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<PriceBar>, QuoteError> {
            Ok(self.bars.clone())
        }
    }

    #[async_trait]
    impl InstrumentDirectory for FakeBroker {
        async fn lookup_name(
            &self,
            _token: &AccessToken,
            _code: &InstrumentCode,
        ) -> Result<Option<String>, QuoteError> {
            Ok(self.name.clone())
        }
    }

    #[async_trait]
    impl OrderGateway for FakeBroker {
        async fn submit_market_order(
            &self,
            _token: &AccessToken,
            _code: &InstrumentCode,
            quantity: u32,
            side: OrderSide,
        ) -> Result<OrderOutcome, OrderError> {
            self.orders.lock().unwrap().push((side, quantity));
            let reply = self.order_replies.lock().unwrap().pop_front();
            Ok(reply.unwrap_or(OrderOutcome::Filled {
                order_id: "0000117057".into(),
            }))
        }
    }

    #[async_trait]
    impl NotificationSink for FakeBroker {
        async fn send(&self, text: &str) -> bool {
            self.messages.lock().unwrap().push(text.to_string());
            self.notify_ok
        }
    }

    struct Harness {
        broker: Arc<FakeBroker>,
        runner: SessionRunner,
        _dir: tempfile::TempDir,
    }

    fn harness(broker: FakeBroker) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(broker);
        let gateways = Gateways {
            authenticator: broker.clone(),
            market_data: broker.clone(),
            directory: broker.clone(),
            orders: broker.clone(),
            notifier: broker.clone(),
        };
        let runner = SessionRunner::new(
            gateways,
            TokenCache::new(dir.path().join("kis_token.json")),
            WatchlistStore::new(dir.path().join("watchlist.json")),
        );
        Harness {
            broker,
            runner,
            _dir: dir,
        }
    }

    fn samsung() -> InstrumentCode {
        InstrumentCode::new("005930").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn armed_session(config: InstrumentConfig) -> Session {
        let mut watchlist = Watchlist::default();
        watchlist
            .set_config(&samsung(), InstrumentConfig { armed: true, ..config })
            .unwrap();
        Session::new(watchlist, today())
    }

    fn manual_buy_config() -> InstrumentConfig {
        InstrumentConfig {
            buy: TriggerRule::percent(dec!(-3)).manual(dec!(68000)),
            quantity: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_buy_fills_once_per_day() {
        let h = harness(FakeBroker::with_prices(&[dec!(67500), dec!(67000)]));
        let mut session = armed_session(manual_buy_config());

        let first = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert_eq!(first.filled().count(), 1);
        assert_eq!(first.targets.buy, dec!(68000));
        assert!(first.state.buy_fired());

        let second = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert!(second.legs.is_empty());
        assert!(second.state.buy_fired());

        assert_eq!(*h.broker.orders.lock().unwrap(), vec![(OrderSide::Buy, 10)]);
    }

    #[tokio::test]
    async fn test_fill_is_persisted_and_notified() {
        let h = harness(FakeBroker {
            name: Some("삼성전자".into()),
            ..FakeBroker::with_prices(&[dec!(67500)])
        });
        let mut session = armed_session(manual_buy_config());

        let report = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert_eq!(report.name, "삼성전자");
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert!(!session.is_dirty());

        let messages = h.broker.messages.lock().unwrap().clone();
        assert_eq!(
            messages,
            vec!["[BUY filled] 삼성전자\ntarget: 68000\nprice: 67500".to_string()]
        );

        // A restart on the same day sees the fill.
        let reloaded = h.runner.store().load().unwrap();
        assert!(reloaded.dispatch_state(&samsung(), today()).buy_fired());
        assert_eq!(reloaded.name(&samsung()), Some("삼성전자"));
    }

    #[tokio::test]
    async fn test_rejected_order_retries_next_tick() {
        let broker = FakeBroker::with_prices(&[dec!(67500)]);
        broker
            .order_replies
            .lock()
            .unwrap()
            .push_back(OrderOutcome::Rejected {
                reason: "insufficient funds".into(),
            });
        let h = harness(broker);
        let mut session = armed_session(manual_buy_config());

        let first = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert_eq!(
            first.legs[0].outcome,
            LegOutcome::Rejected {
                reason: "insufficient funds".into()
            }
        );
        assert!(!first.state.buy_fired());

        let second = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert_eq!(second.filled().count(), 1);
        assert_eq!(h.broker.orders.lock().unwrap().len(), 2);
        assert!(h.broker.messages.lock().unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_new_trading_date_re_arms_legs() {
        let h = harness(FakeBroker::with_prices(&[dec!(67500)]));
        let mut session = armed_session(manual_buy_config());

        h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        let tomorrow = today().succ_opt().unwrap();
        let next_day = h.runner.tick(&mut session, &samsung(), tomorrow).await.unwrap();

        assert_eq!(next_day.filled().count(), 1);
        assert_eq!(session.trading_date(), tomorrow);
    }

    #[tokio::test]
    async fn test_disarmed_never_orders() {
        let h = harness(FakeBroker::with_prices(&[dec!(1), dec!(1000000)]));
        let mut session = Session::new(Watchlist::default(), today());

        for _ in 0..2 {
            let report = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
            assert!(!report.armed);
            assert!(report.legs.is_empty());
        }
        assert!(h.broker.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_undo_fill() {
        let h = harness(FakeBroker {
            notify_ok: false,
            ..FakeBroker::with_prices(&[dec!(67500)])
        });
        let mut session = armed_session(manual_buy_config());

        let report = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert!(matches!(
            report.legs[0].outcome,
            LegOutcome::Filled { notified: false, .. }
        ));
        assert!(report.state.buy_fired());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_quote_failure_leaves_state_untouched() {
        let h = harness(FakeBroker {
            quote_fails: true,
            ..FakeBroker::with_prices(&[dec!(67500)])
        });
        let mut session = armed_session(manual_buy_config());
        let before = session.watchlist().clone();

        let err = h.runner.tick(&mut session, &samsung(), today()).await.unwrap_err();
        assert!(matches!(err, TickError::Quote { .. }));
        assert!(!err.is_fatal());
        assert_eq!(session.watchlist(), &before);
        assert!(h.broker.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal_for_tick_all() {
        let h = harness(FakeBroker {
            auth_fails: true,
            ..FakeBroker::with_prices(&[dec!(67500)])
        });
        let mut session = armed_session(manual_buy_config());

        let err = h.runner.tick_all(&mut session, today()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_token_is_reused_within_session() {
        let h = harness(FakeBroker::with_prices(&[dec!(70000)]));
        let mut session = armed_session(manual_buy_config());

        h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        h.runner.tick(&mut session, &samsung(), today()).await.unwrap();

        assert_eq!(h.broker.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_cached_token_forces_authentication() {
        let h = harness(FakeBroker::with_prices(&[dec!(70000)]));
        let now = Utc::now();
        h.runner
            .token_cache
            .store("stale", now - Duration::hours(7))
            .unwrap();
        let mut session = Session::new(Watchlist::default(), today());

        let token = h.runner.ensure_token_at(&mut session, now).await.unwrap();
        assert_eq!(token.expose(), "fresh");
        assert_eq!(h.broker.auth_calls.load(Ordering::SeqCst), 1);

        // The fresh token replaced the stale one on disk.
        let cached = h.runner.token_cache.get_valid_token_at(now).unwrap();
        assert_eq!(cached.expose(), "fresh");
    }

    #[tokio::test]
    async fn test_valid_cached_token_skips_authentication() {
        let h = harness(FakeBroker::with_prices(&[dec!(70000)]));
        let now = Utc::now();
        h.runner
            .token_cache
            .store("cached", now - Duration::hours(1))
            .unwrap();
        let mut session = Session::new(Watchlist::default(), today());

        let token = h.runner.ensure_token_at(&mut session, now).await.unwrap();
        assert_eq!(token.expose(), "cached");
        assert_eq!(h.broker.auth_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signal_reported_with_short_history() {
        let h = harness(FakeBroker::with_prices(&[dec!(70000)]));
        let mut session = Session::new(Watchlist::default(), today());

        let report = h.runner.tick(&mut session, &samsung(), today()).await.unwrap();
        let signal = report.signal.unwrap();
        assert_eq!(signal.label, SignalLabel::InsufficientData);
    }

    #[tokio::test]
    async fn test_unwatched_code_is_error() {
        let h = harness(FakeBroker::with_prices(&[dec!(70000)]));
        let mut session = Session::new(Watchlist::default(), today());
        let other = InstrumentCode::new("000660").unwrap();

        let err = h.runner.tick(&mut session, &other, today()).await.unwrap_err();
        assert!(matches!(err, TickError::NotWatched(_)));
    }

    #[tokio::test]
    async fn test_persist_failure_is_warning_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();

        let broker = Arc::new(FakeBroker::with_prices(&[dec!(67500)]));
        let gateways = Gateways {
            authenticator: broker.clone(),
            market_data: broker.clone(),
            directory: broker.clone(),
            orders: broker.clone(),
            notifier: broker.clone(),
        };
        let runner = SessionRunner::new(
            gateways,
            TokenCache::new(dir.path().join("kis_token.json")),
            WatchlistStore::new(blocker.join("watchlist.json")),
        );
        let mut session = armed_session(manual_buy_config());

        let report = runner.tick(&mut session, &samsung(), today()).await.unwrap();
        assert!(report.state.buy_fired());
        assert!(report.warnings.iter().any(|w| w.starts_with("state not saved")));
        assert!(session.is_dirty());
    }

    #[test]
    fn test_fill_message() {
        assert_eq!(
            fill_message(OrderSide::Sell, "005930", dec!(73500), dec!(73600)),
            "[SELL filled] 005930\ntarget: 73500\nprice: 73600"
        );
    }
}
