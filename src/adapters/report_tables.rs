//! Shared table layouts for report adapters.
//!
//! Both the spreadsheet and CSV reporters emit the same three tables; the row
//! builders here keep their shapes identical. Headers are always present even
//! when a run produced no rows.

use crate::domain::backtest::BacktestResult;

pub const TRADE_LOG_TABLE: &str = "Trade Log";
pub const PNL_SUMMARY_TABLE: &str = "P&L Summary";
pub const WIN_RATIO_TABLE: &str = "Win Ratio";

pub const TRADE_LOG_HEADER: [&str; 7] = [
    "symbol",
    "buy_date",
    "buy_price",
    "sell_date",
    "sell_price",
    "pnl",
    "status",
];
pub const PNL_SUMMARY_HEADER: [&str; 3] = ["symbol", "total_pnl", "total_trades"];
pub const WIN_RATIO_HEADER: [&str; 4] = ["symbol", "win_ratio", "win_count", "loss_count"];

fn header_row(header: &[&str]) -> Vec<String> {
    header.iter().map(|h| h.to_string()).collect()
}

/// Trade log rows: header plus one row per closed trade across all symbols.
pub fn trade_log_rows(results: &[BacktestResult]) -> Vec<Vec<String>> {
    let mut rows = vec![header_row(&TRADE_LOG_HEADER)];
    for result in results {
        for trade in &result.trade_log {
            rows.push(vec![
                trade.symbol.clone(),
                trade.buy_date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", trade.buy_price),
                trade.sell_date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", trade.sell_price),
                format!("{:.2}", trade.pnl),
                trade.status.to_string(),
            ]);
        }
    }
    rows
}

/// P&L summary rows: one row per symbol.
pub fn pnl_summary_rows(results: &[BacktestResult]) -> Vec<Vec<String>> {
    let mut rows = vec![header_row(&PNL_SUMMARY_HEADER)];
    for result in results {
        rows.push(vec![
            result.symbol.clone(),
            format!("{:.2}", result.total_pnl),
            result.total_trades.to_string(),
        ]);
    }
    rows
}

/// Win ratio rows: one row per symbol, ratio formatted to two decimals.
pub fn win_ratio_rows(results: &[BacktestResult]) -> Vec<Vec<String>> {
    let mut rows = vec![header_row(&WIN_RATIO_HEADER)];
    for result in results {
        rows.push(vec![
            result.symbol.clone(),
            format!("{:.2}", result.win_ratio),
            result.win_count.to_string(),
            result.loss_count.to_string(),
        ]);
    }
    rows
}
