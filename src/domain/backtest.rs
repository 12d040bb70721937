//! Single-position trade simulator.
//!
//! Consumes an indicator-annotated series (already filtered to eligible bars)
//! and produces one [`BacktestResult`] per run. The position lifecycle is
//! NoPosition -> Open -> Closed; the default policy opens on the first
//! eligible bar and closes on the last, so a trade is always produced for
//! reporting whenever any eligible bar exists.

use crate::domain::annotate::AnnotatedBar;
use crate::domain::strategy::{GatedParams, StrategyConfig, TradePolicy};
use chrono::NaiveDate;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Open,
    Closed,
    ClosedForced,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "Open"),
            TradeStatus::Closed => write!(f, "Closed"),
            TradeStatus::ClosedForced => write!(f, "Closed (Forced Exit)"),
        }
    }
}

/// One simulated round trip. Immutable once closed.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub symbol: String,
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub sell_date: NaiveDate,
    pub sell_price: f64,
    pub pnl: f64,
    pub status: TradeStatus,
}

/// Aggregate outcome for one symbol. Lives only for the run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub total_pnl: f64,
    /// Percentage in [0, 100].
    pub win_ratio: f64,
    pub win_count: usize,
    pub loss_count: usize,
    pub total_trades: usize,
    pub trade_log: Vec<TradeRecord>,
}

impl BacktestResult {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_pnl: 0.0,
            win_ratio: 0.0,
            win_count: 0,
            loss_count: 0,
            total_trades: 0,
            trade_log: Vec::new(),
        }
    }
}

/// Simulate the configured policy over the eligible bars of one symbol.
///
/// Zero eligible bars is not an error: the result simply records zero trades.
pub fn simulate(symbol: &str, eligible: &[AnnotatedBar], config: &StrategyConfig) -> BacktestResult {
    if eligible.is_empty() {
        warn!(symbol, "no usable data after indicator filtering, zero-trade result");
        return BacktestResult::empty(symbol);
    }

    info!(symbol, bars = eligible.len(), "running backtest");

    let trades = match &config.policy {
        TradePolicy::HoldPeriod => hold_period_trades(symbol, eligible),
        TradePolicy::IndicatorGated(params) => gated_trades(symbol, eligible, params),
    };

    tally(symbol, trades, config.breakeven_is_win)
}

/// Buy at the first bar's open, sell at the last bar's close.
fn hold_period_trades(symbol: &str, eligible: &[AnnotatedBar]) -> Vec<TradeRecord> {
    let first = &eligible[0].bar;
    let last = &eligible[eligible.len() - 1].bar;

    let buy_price = first.open;
    let sell_price = last.close;
    let pnl = sell_price - buy_price;

    info!(
        symbol,
        buy_price,
        buy_date = %first.date,
        sell_price,
        sell_date = %last.date,
        pnl,
        "simulated hold-period trade"
    );

    vec![TradeRecord {
        symbol: symbol.to_string(),
        buy_date: first.date,
        buy_price,
        sell_date: last.date,
        sell_price,
        pnl,
        status: TradeStatus::Closed,
    }]
}

/// RSI-oversold + SMA-crossover entries, take-profit/stop-loss exits, forced
/// close at period end.
fn gated_trades(symbol: &str, eligible: &[AnnotatedBar], params: &GatedParams) -> Vec<TradeRecord> {
    struct OpenPosition {
        buy_date: NaiveDate,
        buy_price: f64,
    }

    let mut trades = Vec::new();
    let mut position: Option<OpenPosition> = None;

    for pair in eligible.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        let (Some(rsi), Some(sma20), Some(sma50)) = (current.rsi14, current.sma20, current.sma50)
        else {
            continue;
        };
        let (Some(prev_sma20), Some(prev_sma50)) = (prev.sma20, prev.sma50) else {
            continue;
        };

        if position.is_none() {
            let oversold = rsi < params.rsi_oversold;
            let bullish_cross = prev_sma20 <= prev_sma50 && sma20 > sma50;
            if oversold && bullish_cross {
                let buy_price = current.bar.open;
                info!(symbol, buy_price, date = %current.bar.date, "entry signal");
                position = Some(OpenPosition {
                    buy_date: current.bar.date,
                    buy_price,
                });
            }
        }

        if let Some(open) = &position {
            let target = open.buy_price * (1.0 + params.take_profit_pct);
            let stop = open.buy_price * (1.0 - params.stop_loss_pct);

            let sell_price = if current.bar.high >= target {
                info!(symbol, sell_price = target, date = %current.bar.date, "profit target hit");
                Some(target)
            } else if current.bar.low <= stop {
                info!(symbol, sell_price = stop, date = %current.bar.date, "stop loss hit");
                Some(stop)
            } else {
                None
            };

            if let Some(sell_price) = sell_price {
                trades.push(TradeRecord {
                    symbol: symbol.to_string(),
                    buy_date: open.buy_date,
                    buy_price: open.buy_price,
                    sell_date: current.bar.date,
                    sell_price,
                    pnl: sell_price - open.buy_price,
                    status: TradeStatus::Closed,
                });
                position = None;
            }
        }
    }

    if let Some(open) = position {
        let last = &eligible[eligible.len() - 1].bar;
        let sell_price = last.close;
        info!(symbol, sell_price, date = %last.date, "forced exit at period end");
        trades.push(TradeRecord {
            symbol: symbol.to_string(),
            buy_date: open.buy_date,
            buy_price: open.buy_price,
            sell_date: last.date,
            sell_price,
            pnl: sell_price - open.buy_price,
            status: TradeStatus::ClosedForced,
        });
    }

    trades
}

fn tally(symbol: &str, trades: Vec<TradeRecord>, breakeven_is_win: bool) -> BacktestResult {
    let mut win_count = 0;
    let mut loss_count = 0;
    let mut total_pnl = 0.0;

    for trade in &trades {
        total_pnl += trade.pnl;
        if trade.pnl > 0.0 || (breakeven_is_win && trade.pnl == 0.0) {
            win_count += 1;
        } else {
            loss_count += 1;
        }
    }

    let total_trades = trades.len();
    let win_ratio = if total_trades > 0 {
        100.0 * win_count as f64 / total_trades as f64
    } else {
        0.0
    };

    BacktestResult {
        symbol: symbol.to_string(),
        total_pnl,
        win_ratio,
        win_count,
        loss_count,
        total_trades,
        trade_log: trades,
    }
}
