//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i < period - 1 {
            sum += bar.close;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i == period - 1 {
            sum += bar.close;
            ema = sum / period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                symbol: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);

        if let IndicatorValue::Simple(v) = series.values[2].value {
            let expected = (10.0 + 20.0 + 30.0) / 3.0;
            assert!((v - expected).abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn ema_recursive_step() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let seed = 20.0;
        let expected = 40.0 * k + seed * (1.0 - k);
        if let IndicatorValue::Simple(v) = series.values[3].value {
            assert!((v - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_constant_prices() {
        let bars = make_bars(&[100.0; 10]);
        let series = calculate_ema(&bars, 4);

        for point in series.values.iter().filter(|p| p.valid) {
            if let IndicatorValue::Simple(v) = point.value {
                assert!((v - 100.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn ema_empty_and_zero_period() {
        assert!(calculate_ema(&[], 3).values.is_empty());
        let bars = make_bars(&[10.0, 20.0]);
        assert!(calculate_ema(&bars, 0).values.is_empty());
    }
}
