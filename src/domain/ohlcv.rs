//! Daily price bar representation.

use crate::domain::error::PipelineError;
use chrono::NaiveDate;

/// One calendar day of trading for one symbol. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Check the series invariants: ascending dates, no duplicates.
///
/// Fetch adapters call this after parsing so malformed provider payloads are
/// rejected before any indicator math runs.
pub fn ensure_ordered(bars: &[PriceBar]) -> Result<(), PipelineError> {
    for pair in bars.windows(2) {
        if pair[1].date == pair[0].date {
            return Err(PipelineError::InvalidInput {
                reason: format!("duplicate date {} in series", pair[0].date),
            });
        }
        if pair[1].date < pair[0].date {
            return Err(PipelineError::InvalidInput {
                reason: format!(
                    "out-of-order dates: {} follows {}",
                    pair[1].date, pair[0].date
                ),
            });
        }
    }
    Ok(())
}
