//! Dry run order gateway for simulated fills.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use auth::AccessToken;
use model::{InstrumentCode, OrderOutcome, OrderSide};
use strategy_core::{OrderError, OrderGateway};
use tracing::info;

/// Counter for generating unique simulated order numbers.
static SIMULATED_ORDER_ID: AtomicU64 = AtomicU64::new(1_000_000);

/// Fills every market order immediately without contacting the brokerage.
///
/// This lets the whole tick run against live quotes, including dispatch
/// state and notifications, without placing real orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunOrderGateway;

#[async_trait]
impl OrderGateway for DryRunOrderGateway {
    async fn submit_market_order(
        &self,
        _token: &AccessToken,
        code: &InstrumentCode,
        quantity: u32,
        side: OrderSide,
    ) -> Result<OrderOutcome, OrderError> {
        if quantity == 0 {
            return Ok(OrderOutcome::Rejected {
                reason: "quantity must be positive".to_string(),
            });
        }

        let order_id = format!("DRY-{}", SIMULATED_ORDER_ID.fetch_add(1, Ordering::Relaxed));
        info!(
            code = %code,
            side = %side,
            quantity = quantity,
            order_id = %order_id,
            "[DRY RUN] Simulated market order fill"
        );

        Ok(OrderOutcome::Filled { order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn code() -> InstrumentCode {
        InstrumentCode::new("005930").unwrap()
    }

    #[tokio::test]
    async fn test_simulated_fill_has_unique_ids() {
        let token = AccessToken::new("tok", Utc::now());
        let first = DryRunOrderGateway
            .submit_market_order(&token, &code(), 10, OrderSide::Buy)
            .await
            .unwrap();
        let second = DryRunOrderGateway
            .submit_market_order(&token, &code(), 10, OrderSide::Sell)
            .await
            .unwrap();

        match (first, second) {
            (OrderOutcome::Filled { order_id: a }, OrderOutcome::Filled { order_id: b }) => {
                assert!(a.starts_with("DRY-"));
                assert_ne!(a, b);
            }
            other => panic!("expected two fills, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let token = AccessToken::new("tok", Utc::now());
        let outcome = DryRunOrderGateway
            .submit_market_order(&token, &code(), 0, OrderSide::Buy)
            .await
            .unwrap();
        assert!(!outcome.is_filled());
    }
}
