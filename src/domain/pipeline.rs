//! Run orchestration.
//!
//! Sequences one run end to end: fetch every configured symbol, backtest each
//! non-empty series, hand the batch to the reporter, then train the per-symbol
//! classifier, alerting at each milestone. Everything is synchronous and
//! sequential; per-symbol failures are logged and skipped, and only a total
//! absence of usable data aborts the run.

use crate::domain::annotate::{annotate, eligible_bars};
use crate::domain::backtest::{simulate, BacktestResult};
use crate::domain::classifier::{train_and_evaluate, ClassifierConfig};
use crate::domain::error::PipelineError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::StrategyConfig;
use crate::domain::universe::filter_lookback;
use crate::ports::alert_port::AlertPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub symbols: Vec<String>,
    pub lookback_days: i64,
    pub strategy: StrategyConfig,
    pub ml_enabled: bool,
    pub classifier: ClassifierConfig,
}

/// What one run produced, for the caller's summary output.
#[derive(Debug)]
pub struct RunSummary {
    pub results: Vec<BacktestResult>,
    pub report_ok: bool,
    /// Per-symbol held-out accuracy; `None` marks a skipped symbol.
    pub classifier_outcomes: Vec<(String, Option<f64>)>,
}

/// Fetch every symbol's series, trimmed to the lookback window.
///
/// Symbols that fail to fetch or end up empty are skipped with a diagnostic;
/// insertion order follows the configured symbol order.
pub fn fetch_all(
    data_port: &dyn MarketDataPort,
    symbols: &[String],
    today: NaiveDate,
    lookback_days: i64,
) -> IndexMap<String, Vec<PriceBar>> {
    let mut all_data = IndexMap::new();

    for symbol in symbols {
        let bars = match data_port.fetch_daily(symbol) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol, fetch failed");
                continue;
            }
        };

        let filtered = filter_lookback(bars, today, lookback_days);
        if filtered.is_empty() {
            warn!(symbol = %symbol, lookback_days, "no bars inside lookback window, skipping");
            continue;
        }

        info!(symbol = %symbol, bars = filtered.len(), "fetched series");
        all_data.insert(symbol.clone(), filtered);
    }

    all_data
}

/// Backtest each non-empty series, preserving input iteration order.
///
/// Symbols are independent: a malformed series is skipped with a diagnostic
/// and never aborts the batch.
pub fn run_backtests(
    data: &IndexMap<String, Vec<PriceBar>>,
    strategy: &StrategyConfig,
) -> Vec<BacktestResult> {
    let mut results = Vec::new();

    for (symbol, series) in data {
        if series.is_empty() {
            warn!(symbol = %symbol, "skipping backtest, series is empty");
            continue;
        }

        let annotated = match annotate(series) {
            Ok(a) => a,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping backtest, annotation failed");
                continue;
            }
        };

        let result = simulate(symbol, &eligible_bars(&annotated), strategy);
        info!(
            symbol = %symbol,
            total_pnl = result.total_pnl,
            trades = result.total_trades,
            "backtest completed"
        );
        results.push(result);
    }

    results
}

/// Best-effort alert: delivery failure is logged, never propagated.
pub fn notify(alert_port: &dyn AlertPort, message: &str) {
    if let Err(e) = alert_port.send(message) {
        warn!(error = %e, "alert delivery failed");
    }
}

/// Execute one full run. Returns `NoUsableData` when nothing could be fetched
/// or no backtest produced a result; any other collaborator failure is logged
/// and the run continues.
pub fn run_pipeline(
    config: &RunConfig,
    data_port: &dyn MarketDataPort,
    report_port: &dyn ReportPort,
    alert_port: &dyn AlertPort,
    today: NaiveDate,
) -> Result<RunSummary, PipelineError> {
    info!("starting paper trading run");

    let stock_data = fetch_all(data_port, &config.symbols, today, config.lookback_days);
    if stock_data.is_empty() {
        error!("failed to fetch any stock data, aborting run");
        notify(
            alert_port,
            "papertrader: failed to fetch stock data. Check API key and connectivity.",
        );
        return Err(PipelineError::NoUsableData);
    }
    info!(symbols = stock_data.len(), "fetched data");

    let results = run_backtests(&stock_data, &config.strategy);
    if results.is_empty() {
        warn!("no backtest results generated for any symbol");
        notify(alert_port, "papertrader: no backtest results generated.");
        return Err(PipelineError::NoUsableData);
    }

    for result in &results {
        if result.total_trades > 0 {
            notify(
                alert_port,
                &format!(
                    "papertrader: backtest for {} completed.\nTotal P&L: {:.2}\nWin Ratio: {:.2}%\nTotal Trades: {}",
                    result.symbol, result.total_pnl, result.win_ratio, result.total_trades
                ),
            );
        }
    }

    let report_ok = match report_port.write(&results) {
        Ok(()) => {
            info!("report updated");
            notify(alert_port, "papertrader: report updated with backtest results.");
            true
        }
        Err(e) => {
            error!(error = %e, "report update failed");
            notify(alert_port, &format!("papertrader: error updating report: {e}"));
            false
        }
    };

    let mut classifier_outcomes = Vec::new();
    if config.ml_enabled {
        for (symbol, series) in &stock_data {
            let outcome = train_symbol(symbol, series, &config.classifier, alert_port);
            classifier_outcomes.push((symbol.clone(), outcome));
        }
    }

    info!("paper trading run finished");
    notify(alert_port, "papertrader: all processes completed.");

    Ok(RunSummary {
        results,
        report_ok,
        classifier_outcomes,
    })
}

fn train_symbol(
    symbol: &str,
    series: &[PriceBar],
    config: &ClassifierConfig,
    alert_port: &dyn AlertPort,
) -> Option<f64> {
    info!(symbol, "training classifier");
    match train_and_evaluate(series, config) {
        Some((_, accuracy)) => {
            info!(symbol, accuracy, "classifier trained");
            notify(
                alert_port,
                &format!("papertrader: model for {symbol} trained. Accuracy: {accuracy:.2}"),
            );
            Some(accuracy)
        }
        None => {
            warn!(symbol, "classifier training skipped");
            notify(
                alert_port,
                &format!("papertrader: model training skipped or failed for {symbol}."),
            );
            None
        }
    }
}
