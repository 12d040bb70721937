#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use papertrader::domain::backtest::BacktestResult;
use papertrader::domain::error::PipelineError;
pub use papertrader::domain::ohlcv::PriceBar;
use papertrader::ports::alert_port::AlertPort;
use papertrader::ports::data_port::MarketDataPort;
use papertrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: NaiveDate, open: f64, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.into(),
        date,
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 100_000,
    }
}

/// A deterministic wiggly series: enough variation for every indicator to
/// produce meaningful values.
pub fn generate_series(symbol: &str, start: NaiveDate, n: usize, base: f64) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = base + ((i % 9) as f64 - 4.0) * 1.5;
            make_bar(symbol, start + Duration::days(i as i64), close - 0.5, close)
        })
        .collect()
}

/// A flat series with a chosen open price and final close, so hold-period
/// trade arithmetic is exact: every bar opens at `open_price`, every close is
/// 100.0 except the last.
pub fn flat_series_with_endpoints(
    symbol: &str,
    start: NaiveDate,
    n: usize,
    open_price: f64,
    last_close: f64,
) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = if i == n - 1 { last_close } else { 100.0 };
            make_bar(symbol, start + Duration::days(i as i64), open_price, close)
        })
        .collect()
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PriceBar>, PipelineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PipelineError::Transport {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars.clone()),
            None => Err(PipelineError::NotFound {
                symbol: symbol.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MockReportPort {
    pub written: RefCell<Vec<Vec<String>>>,
    pub fail: bool,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn write_count(&self) -> usize {
        self.written.borrow().len()
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, results: &[BacktestResult]) -> Result<(), PipelineError> {
        if self.fail {
            return Err(PipelineError::Reporting {
                reason: "simulated reporting failure".into(),
            });
        }
        self.written
            .borrow_mut()
            .push(results.iter().map(|r| r.symbol.clone()).collect());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAlertPort {
    pub messages: RefCell<Vec<String>>,
    pub fail: bool,
}

impl MockAlertPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }
}

impl AlertPort for MockAlertPort {
    fn send(&self, message: &str) -> Result<(), PipelineError> {
        if self.fail {
            return Err(PipelineError::Alert {
                reason: "simulated alert failure".into(),
            });
        }
        self.messages.borrow_mut().push(message.to_string());
        Ok(())
    }
}

pub fn series_map(entries: Vec<(&str, Vec<PriceBar>)>) -> IndexMap<String, Vec<PriceBar>> {
    entries
        .into_iter()
        .map(|(symbol, bars)| (symbol.to_string(), bars))
        .collect()
}
