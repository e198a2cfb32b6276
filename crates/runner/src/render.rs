//! Plain-text rendering of tick results for the terminal.

use std::fmt::Write;

use model::InstrumentCode;
use rust_decimal::Decimal;
use strategy_core::{InstrumentConfig, SignalReport};
use strategy_runner::{LegOutcome, TickReport};
use watchlist::Watchlist;

fn flag(fired: bool) -> &'static str {
    if fired {
        "done"
    } else {
        "open"
    }
}

fn rule(pct: Decimal, manual: Decimal) -> String {
    if manual > Decimal::ZERO {
        format!("@{manual}")
    } else {
        format!("{pct:+}%")
    }
}

pub fn signal_line(signal: &SignalReport) -> String {
    format!(
        "signal: {} (score {}) rsi {} vol {}% ma5 {} ma20 {}",
        signal.label, signal.score, signal.rsi, signal.volume_ratio, signal.ma5, signal.ma20
    )
}

pub fn tick_report(report: &TickReport) -> String {
    let mut out = String::new();
    let q = &report.quote;

    let _ = writeln!(
        out,
        "{} {}  {} (prev {}, {:+}%)",
        report.code, report.name, q.last_price, q.reference_price, q.change_pct
    );
    let _ = writeln!(
        out,
        "  buy {} [{}]  sell {} [{}]  {}",
        report.targets.buy,
        flag(report.state.buy_fired()),
        report.targets.sell,
        flag(report.state.sell_fired()),
        if report.armed { "ARMED" } else { "disarmed" }
    );

    if let Some(signal) = &report.signal {
        let _ = writeln!(out, "  {}", signal_line(signal));
    }

    for result in &report.legs {
        let leg = &result.leg;
        let outcome = match &result.outcome {
            LegOutcome::Filled { order_id, .. } => format!("filled #{order_id}"),
            LegOutcome::Rejected { reason } => format!("rejected: {reason}"),
            LegOutcome::Failed { error } => format!("failed: {error}"),
        };
        let _ = writeln!(
            out,
            "  {} {} @ {}: {}",
            leg.side, leg.quantity, leg.target, outcome
        );
    }

    for warning in &report.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }

    out
}

fn config_line(code: &InstrumentCode, name: &str, config: &InstrumentConfig) -> String {
    format!(
        "{code} {name}  buy {}  sell {}  qty {}  {}",
        rule(config.buy.pct, config.buy.manual_price),
        rule(config.sell.pct, config.sell.manual_price),
        config.quantity,
        if config.armed { "ARMED" } else { "disarmed" }
    )
}

pub fn watchlist(watchlist: &Watchlist) -> String {
    if watchlist.is_empty() {
        return "watchlist is empty\n".to_string();
    }

    let mut out = String::new();
    for code in watchlist.codes() {
        let config = watchlist.config(code).cloned().unwrap_or_default();
        let _ = writeln!(
            out,
            "{}",
            config_line(code, watchlist.name_or_code(code), &config)
        );
    }
    out
}
