//! Per-bar indicator annotation for the trade simulator.
//!
//! Attaches RSI-14, SMA-20 and SMA-50 to each price bar. A bar is *eligible*
//! for simulation only when all three values are defined, so the first 49 bars
//! of any series (SMA-50 warmup being the binding constraint) never trade.

use crate::domain::error::PipelineError;
use crate::domain::indicator::{calculate_rsi, calculate_sma, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;

#[derive(Debug, Clone)]
pub struct AnnotatedBar {
    pub bar: PriceBar,
    pub rsi14: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
}

impl AnnotatedBar {
    pub fn is_eligible(&self) -> bool {
        self.rsi14.is_some() && self.sma20.is_some() && self.sma50.is_some()
    }
}

/// Annotate a price series with RSI-14, SMA-20 and SMA-50.
///
/// Pure function of the input. Fails on an empty or malformed series rather
/// than producing partial output; a short-but-valid series succeeds with zero
/// eligible bars, which downstream treats as "no usable data".
pub fn annotate(series: &[PriceBar]) -> Result<Vec<AnnotatedBar>, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::InvalidInput {
            reason: "empty price series".into(),
        });
    }
    if let Some(bad) = series.iter().find(|b| !b.close.is_finite()) {
        return Err(PipelineError::InvalidInput {
            reason: format!("non-finite close on {}", bad.date),
        });
    }

    let rsi = calculate_rsi(series, RSI_PERIOD);
    let sma_short = calculate_sma(series, SMA_SHORT);
    let sma_long = calculate_sma(series, SMA_LONG);

    let point = |s: &IndicatorSeries, i: usize| -> Option<f64> {
        s.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value.simple())
    };

    Ok(series
        .iter()
        .enumerate()
        .map(|(i, bar)| AnnotatedBar {
            bar: bar.clone(),
            rsi14: point(&rsi, i),
            sma20: point(&sma_short, i),
            sma50: point(&sma_long, i),
        })
        .collect())
}

/// Bars where every indicator is defined, in input order.
pub fn eligible_bars(annotated: &[AnnotatedBar]) -> Vec<AnnotatedBar> {
    annotated
        .iter()
        .filter(|a| a.is_eligible())
        .cloned()
        .collect()
}
