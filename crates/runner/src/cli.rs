//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use model::InstrumentCode;
use rust_decimal::Decimal;
use strategy_core::InstrumentConfig;

#[derive(Debug, Parser)]
#[command(
    name = "kis-trader",
    about = "Price-trigger trading assistant for KIS domestic stocks",
    version
)]
pub struct Cli {
    /// Config file (defaults to kis-trader.toml, or $KIS_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh one instrument, or every watched instrument.
    Tick {
        code: Option<InstrumentCode>,
    },
    /// Manage the watchlist.
    Watch {
        #[command(subcommand)]
        command: WatchCommand,
    },
    /// Change an instrument's trigger configuration.
    Set(SetArgs),
    /// Show the daily-bar signal for an instrument without evaluating triggers.
    Analyze {
        code: InstrumentCode,
    },
}

#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    Add { code: InstrumentCode },
    Remove { code: InstrumentCode },
    List,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    pub code: InstrumentCode,

    /// Buy trigger, percent from the previous close (e.g. -3).
    #[arg(long, allow_negative_numbers = true)]
    pub buy_pct: Option<Decimal>,

    /// Sell trigger, percent from the previous close (e.g. 5).
    #[arg(long, allow_negative_numbers = true)]
    pub sell_pct: Option<Decimal>,

    /// Absolute buy price; 0 clears it.
    #[arg(long)]
    pub buy_price: Option<Decimal>,

    /// Absolute sell price; 0 clears it.
    #[arg(long)]
    pub sell_price: Option<Decimal>,

    /// Shares per order.
    #[arg(long)]
    pub qty: Option<u32>,

    /// Enable automatic orders.
    #[arg(long, conflicts_with = "disarm")]
    pub arm: bool,

    /// Disable automatic orders.
    #[arg(long)]
    pub disarm: bool,
}

impl SetArgs {
    /// `base` with every given option applied. Validation is left to the
    /// watchlist.
    pub fn apply(&self, base: &InstrumentConfig) -> InstrumentConfig {
        let mut config = base.clone();
        if let Some(pct) = self.buy_pct {
            config.buy.pct = pct;
        }
        if let Some(pct) = self.sell_pct {
            config.sell.pct = pct;
        }
        if let Some(price) = self.buy_price {
            config.buy.manual_price = price;
        }
        if let Some(price) = self.sell_price {
            config.sell.manual_price = price;
        }
        if let Some(qty) = self.qty {
            config.quantity = qty;
        }
        if self.arm {
            config.armed = true;
        } else if self.disarm {
            config.armed = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_set_parses_negative_percent() {
        let cli = Cli::parse_from([
            "kis-trader",
            "set",
            "005930",
            "--buy-pct",
            "-2.5",
            "--buy-price",
            "68000",
            "--qty",
            "10",
            "--arm",
        ]);

        let Command::Set(args) = cli.command else {
            panic!("expected set");
        };
        let config = args.apply(&InstrumentConfig::default());
        assert_eq!(config.buy.pct, dec!(-2.5));
        assert_eq!(config.buy.manual_price, dec!(68000));
        assert_eq!(config.sell, InstrumentConfig::default().sell);
        assert_eq!(config.quantity, 10);
        assert!(config.armed);
    }

    #[test]
    fn test_arm_and_disarm_conflict() {
        let result = Cli::try_parse_from(["kis-trader", "set", "005930", "--arm", "--disarm"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_code_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["kis-trader", "watch", "add", "59"]);
        assert!(result.is_err());
    }
}
