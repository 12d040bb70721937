//! Result reporting port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PipelineError;

/// Batch writer for one run's results.
///
/// Implementations overwrite prior contents and always emit the three tables
/// (trade log, P&L summary, win ratio) with headers, even when `results` is
/// empty.
pub trait ReportPort {
    fn write(&self, results: &[BacktestResult]) -> Result<(), PipelineError>;
}
