//! Trigger evaluation and once-per-day dispatch state.

use model::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::instrument::InstrumentConfig;

/// Buy and sell trigger prices for one reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriggerTargets {
    pub buy: Decimal,
    pub sell: Decimal,
}

/// Which legs have been filled for an instrument on the current trading date.
///
/// Flags only ever go from `false` to `true`. A fresh state is obtained by
/// starting a new trading date, never by clearing a flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchState {
    #[serde(default)]
    buy_fired: bool,
    #[serde(default)]
    sell_fired: bool,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buy_fired(&self) -> bool {
        self.buy_fired
    }

    pub fn sell_fired(&self) -> bool {
        self.sell_fired
    }

    pub fn has_fired(&self, side: OrderSide) -> bool {
        match side {
            OrderSide::Buy => self.buy_fired,
            OrderSide::Sell => self.sell_fired,
        }
    }

    /// Record a confirmed fill. Call only after the brokerage reported `Filled`.
    pub fn mark_fired(&mut self, side: OrderSide) {
        match side {
            OrderSide::Buy => self.buy_fired = true,
            OrderSide::Sell => self.sell_fired = true,
        }
    }
}

/// One leg the engine wants dispatched as a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegOrder {
    pub side: OrderSide,
    pub quantity: u32,
    /// The trigger price that was crossed.
    pub target: Decimal,
}

/// Result of evaluating one instrument at one price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchDecision {
    pub targets: TriggerTargets,
    pub buy: Option<LegOrder>,
    pub sell: Option<LegOrder>,
}

impl DispatchDecision {
    /// Fired legs, buy first.
    pub fn legs(&self) -> impl Iterator<Item = LegOrder> + '_ {
        self.buy.iter().chain(self.sell.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_none() && self.sell.is_none()
    }
}

/// Stateless trigger evaluation.
///
/// The engine only decides; submitting orders and calling
/// [`DispatchState::mark_fired`] on a fill is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerEngine;

impl TriggerEngine {
    /// Trigger prices for the given reference price.
    pub fn targets(config: &InstrumentConfig, reference_price: Decimal) -> TriggerTargets {
        TriggerTargets {
            buy: config.buy.target(reference_price),
            sell: config.sell.target(reference_price),
        }
    }

    /// Decide which legs fire at `current_price`.
    ///
    /// Disarmed instruments never fire. Buy fires when the price is at or
    /// below the buy target, sell when at or above the sell target, each only
    /// if it has not already filled today. The legs are independent.
    pub fn evaluate(
        config: &InstrumentConfig,
        current_price: Decimal,
        reference_price: Decimal,
        state: &DispatchState,
    ) -> DispatchDecision {
        let targets = Self::targets(config, reference_price);
        let mut decision = DispatchDecision {
            targets,
            buy: None,
            sell: None,
        };

        if !config.armed {
            return decision;
        }

        if current_price <= targets.buy && !state.buy_fired() {
            debug!(price = %current_price, target = %targets.buy, "Buy trigger crossed");
            decision.buy = Some(LegOrder {
                side: OrderSide::Buy,
                quantity: config.quantity,
                target: targets.buy,
            });
        }

        if current_price >= targets.sell && !state.sell_fired() {
            debug!(price = %current_price, target = %targets.sell, "Sell trigger crossed");
            decision.sell = Some(LegOrder {
                side: OrderSide::Sell,
                quantity: config.quantity,
                target: targets.sell,
            });
        }

        if decision.buy.is_some() && decision.sell.is_some() {
            warn!(
                price = %current_price,
                buy_target = %targets.buy,
                sell_target = %targets.sell,
                "Both legs fired in one evaluation; targets are inverted"
            );
        }

        decision
    }
}
