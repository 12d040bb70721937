//! Symbol list parsing and series windowing.
//!
//! Symbols come from configuration as a comma-separated list. Fetched series
//! are trimmed to a trailing lookback window before backtesting so results
//! reflect recent history rather than the provider's full archive.

use crate::domain::ohlcv::PriceBar;
use chrono::{Duration, NaiveDate};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 180;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list: trims whitespace, uppercases, rejects
/// empty tokens and duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Keep only bars dated within `lookback_days` of `today`, inclusive.
///
/// `today` is injected rather than read from the clock so the window is
/// reproducible in tests.
pub fn filter_lookback(bars: Vec<PriceBar>, today: NaiveDate, lookback_days: i64) -> Vec<PriceBar> {
    let cutoff = today - Duration::days(lookback_days);
    bars.into_iter().filter(|b| b.date >= cutoff).collect()
}
