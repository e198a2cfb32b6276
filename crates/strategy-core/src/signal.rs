//! Advisory technical signal from daily bars.
//!
//! Display only. Nothing here feeds the trigger engine.

use std::fmt;

use model::PriceBar;
use rust_decimal::Decimal;
use serde::Serialize;

/// Fewest bars needed for the 20-day average.
pub const MIN_BARS: usize = 20;
pub const SHORT_WINDOW: usize = 5;
pub const LONG_WINDOW: usize = 20;
pub const RSI_PERIOD: usize = 14;

const RSI_OVERSOLD: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const RSI_OVERBOUGHT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
const VOLUME_SURGE: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Advisory label derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLabel {
    StrongBuy,
    BuyLeaning,
    Hold,
    SellLeaning,
    InsufficientData,
}

impl SignalLabel {
    /// Score thresholds: `>= 4`, `>= 2`, `<= -1`, otherwise hold.
    pub fn from_score(score: i32) -> Self {
        if score >= 4 {
            Self::StrongBuy
        } else if score >= 2 {
            Self::BuyLeaning
        } else if score <= -1 {
            Self::SellLeaning
        } else {
            Self::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "strong buy",
            Self::BuyLeaning => "buy-leaning",
            Self::Hold => "hold",
            Self::SellLeaning => "sell-leaning",
            Self::InsufficientData => "insufficient data",
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`SignalEvaluator::analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalReport {
    pub label: SignalLabel,
    pub score: i32,
    /// RSI-14, in `[0, 100]`.
    pub rsi: Decimal,
    /// Latest volume as a percent of the 5-day average volume.
    pub volume_ratio: Decimal,
    pub ma5: Decimal,
    pub ma20: Decimal,
}

impl SignalReport {
    pub fn insufficient_data() -> Self {
        Self {
            label: SignalLabel::InsufficientData,
            score: 0,
            rsi: Decimal::ZERO,
            volume_ratio: Decimal::ZERO,
            ma5: Decimal::ZERO,
            ma20: Decimal::ZERO,
        }
    }
}

/// Moving averages, RSI and volume ratio over daily bars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEvaluator;

impl SignalEvaluator {
    /// Score `bars` (ascending by date) against `current_price`.
    ///
    /// Fewer than [`MIN_BARS`] bars yields the insufficient-data report.
    pub fn analyze(bars: &[PriceBar], current_price: Decimal) -> SignalReport {
        if bars.len() < MIN_BARS {
            return SignalReport::insufficient_data();
        }

        let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<Decimal> = bars.iter().map(|b| Decimal::from(b.volume)).collect();

        let ma5 = trailing_mean(&closes, SHORT_WINDOW);
        let ma20 = trailing_mean(&closes, LONG_WINDOW);
        let rsi = rsi(&closes, RSI_PERIOD);
        let volume_ratio = volume_ratio(&volumes, SHORT_WINDOW);

        let mut score = 0;
        if current_price > ma20 {
            score += 1;
        }
        if ma5 > ma20 {
            score += 1;
        }
        if volume_ratio > Decimal::ONE_HUNDRED {
            score += 1;
        }
        if volume_ratio > VOLUME_SURGE {
            score += 1;
        }
        if rsi < RSI_OVERSOLD {
            score += 2;
        }
        if rsi > RSI_OVERBOUGHT {
            score -= 2;
        }

        SignalReport {
            label: SignalLabel::from_score(score),
            score,
            rsi: rsi.round_dp(2),
            volume_ratio: volume_ratio.round_dp(2),
            ma5: ma5.round_dp(2),
            ma20: ma20.round_dp(2),
        }
    }
}

/// Mean of the last `window` values. Callers guarantee `values.len() >= window > 0`.
fn trailing_mean(values: &[Decimal], window: usize) -> Decimal {
    let tail = &values[values.len() - window..];
    tail.iter().sum::<Decimal>() / Decimal::from(window)
}

/// RSI from the trailing `period` close-to-close deltas, gains and losses
/// averaged with a simple mean. 100 when there is no loss.
fn rsi(closes: &[Decimal], period: usize) -> Decimal {
    let deltas = closes.windows(2).map(|w| w[1] - w[0]);
    let skip = closes.len().saturating_sub(1).saturating_sub(period);

    let (gain, loss) = deltas
        .skip(skip)
        .fold((Decimal::ZERO, Decimal::ZERO), |(gain, loss), delta| {
            if delta > Decimal::ZERO {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        });

    let n = Decimal::from(period);
    let avg_gain = gain / n;
    let avg_loss = loss / n;

    if avg_loss.is_zero() {
        return Decimal::ONE_HUNDRED;
    }
    let rs = avg_gain / avg_loss;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
}

/// Latest volume over the trailing average, in percent. 0 when the average is 0.
fn volume_ratio(volumes: &[Decimal], window: usize) -> Decimal {
    let average = trailing_mean(volumes, window);
    match volumes.last() {
        Some(&latest) if !average.is_zero() => latest / average * Decimal::ONE_HUNDRED,
        _ => Decimal::ZERO,
    }
}
