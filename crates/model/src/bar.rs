//! Daily price bars.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day of prices, as reported by the quote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Sort bars ascending by date and drop repeated dates (first one wins).
pub fn sort_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn test_sort_bars_orders_and_dedups() {
        let bars = vec![bar(5, dec!(3)), bar(1, dec!(1)), bar(3, dec!(2)), bar(3, dec!(9))];
        let sorted = sort_bars(bars);

        let days: Vec<u32> = sorted.iter().map(|b| chrono::Datelike::day(&b.date)).collect();
        assert_eq!(days, vec![1, 3, 5]);
        assert_eq!(sorted[1].close, dec!(2));
    }
}
