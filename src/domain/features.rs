//! Feature engineering for next-day movement prediction.
//!
//! Builds a per-bar feature matrix from RSI-14, the three MACD components and
//! volume, labelled with whether the following bar closed higher. Bars inside
//! an indicator warmup window and the final bar (no next close) are dropped.

use crate::domain::indicator::{calculate_macd_default, calculate_rsi, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const FEATURE_NAMES: [&str; 5] = ["rsi14", "macd_line", "macd_histogram", "macd_signal", "volume"];

/// A labelled sample matrix for classifier training.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, features: Vec<f64>, label: f64) {
        self.features.push(features);
        self.labels.push(label);
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Build the labelled feature set for one symbol's raw series.
pub fn build_feature_set(series: &[PriceBar]) -> Dataset {
    let mut dataset = Dataset::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect());
    if series.len() < 2 {
        return dataset;
    }

    let rsi = calculate_rsi(series, 14);
    let macd = calculate_macd_default(series);

    for i in 0..series.len() - 1 {
        let rsi_point = &rsi.values[i];
        let macd_point = &macd.values[i];
        if !rsi_point.valid || !macd_point.valid {
            continue;
        }

        let IndicatorValue::Macd {
            line,
            signal,
            histogram,
        } = macd_point.value
        else {
            continue;
        };

        let label = if series[i + 1].close > series[i].close {
            1.0
        } else {
            0.0
        };

        dataset.add_sample(
            vec![
                rsi_point.value.simple(),
                line,
                histogram,
                signal,
                series[i].volume as f64,
            ],
            label,
        );
    }

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_series(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                symbol: "TEST".into(),
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000 + i as i64,
            })
            .collect()
    }

    fn wiggle(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + ((i % 11) as f64 - 5.0) * 1.5)
            .collect()
    }

    #[test]
    fn empty_and_tiny_series_yield_no_samples() {
        assert_eq!(build_feature_set(&[]).n_samples(), 0);
        assert_eq!(build_feature_set(&make_series(&[100.0])).n_samples(), 0);
    }

    #[test]
    fn warmup_and_final_bar_are_dropped() {
        let series = make_series(&wiggle(60));
        let dataset = build_feature_set(&series);

        // MACD signal warmup (33 bars) binds; the last bar has no next close.
        assert_eq!(dataset.n_samples(), 60 - 33 - 1);
        assert_eq!(dataset.n_features(), 5);
    }

    #[test]
    fn labels_reflect_next_close() {
        let series = make_series(&wiggle(60));
        let dataset = build_feature_set(&series);

        // Re-derive the first labelled index and spot-check its label.
        let warmup = 33;
        let expected = if series[warmup + 1].close > series[warmup].close {
            1.0
        } else {
            0.0
        };
        assert_eq!(dataset.labels[0], expected);
        assert!(dataset.labels.iter().all(|&l| l == 0.0 || l == 1.0));
    }

    #[test]
    fn volume_is_carried_as_feature() {
        let series = make_series(&wiggle(60));
        let dataset = build_feature_set(&series);

        let volume_idx = FEATURE_NAMES
            .iter()
            .position(|&n| n == "volume")
            .unwrap();
        assert_eq!(dataset.features[0][volume_idx], series[33].volume as f64);
    }

    #[test]
    fn short_series_below_warmup_is_empty() {
        let dataset = build_feature_set(&make_series(&wiggle(30)));
        assert_eq!(dataset.n_samples(), 0);
    }
}
