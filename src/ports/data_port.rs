//! Market data port trait.

use crate::domain::error::PipelineError;
use crate::domain::ohlcv::PriceBar;

/// Daily bar provider for one symbol at a time.
///
/// Implementations return bars sorted ascending by date. Rate limiting is
/// handled inside the adapter (bounded retry); `RetriesExhausted`, `NotFound`
/// and `Transport` errors surface to the caller, which treats them as
/// per-symbol failures.
pub trait MarketDataPort {
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PriceBar>, PipelineError>;
}
