//! Run configuration construction and validation.
//!
//! Missing or malformed keys are reported before any network call happens, so
//! a bad config fails fast with an exit code instead of partway through a run.

use crate::domain::classifier::ClassifierConfig;
use crate::domain::error::PipelineError;
use crate::domain::pipeline::RunConfig;
use crate::domain::strategy::{GatedParams, StrategyConfig, TradePolicy};
use crate::domain::universe::{parse_symbols, DEFAULT_LOOKBACK_DAYS};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RETRY_MAX: i64 = 5;
pub const DEFAULT_RETRY_BASE_DELAY_SECS: i64 = 60;

fn missing(section: &str, key: &str) -> PipelineError {
    PipelineError::ConfigMissing {
        section: section.into(),
        key: key.into(),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> PipelineError {
    PipelineError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, PipelineError> {
    config
        .get_string(section, key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(section, key))
}

/// Build and validate the full run configuration.
pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, PipelineError> {
    let symbols_raw = require_string(config, "data", "symbols")?;
    let symbols = parse_symbols(&symbols_raw)
        .map_err(|e| invalid("data", "symbols", &e.to_string()))?;

    let lookback_days = config.get_int("data", "lookback_days", DEFAULT_LOOKBACK_DAYS);
    if lookback_days <= 0 {
        return Err(invalid("data", "lookback_days", "must be positive"));
    }

    Ok(RunConfig {
        symbols,
        lookback_days,
        strategy: build_strategy_config(config)?,
        ml_enabled: config.get_bool("ml", "enabled", true),
        classifier: build_classifier_config(config)?,
    })
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, PipelineError> {
    let policy_name = config
        .get_string("strategy", "policy")
        .unwrap_or_else(|| "hold_period".to_string());

    let policy = match policy_name.as_str() {
        "hold_period" => TradePolicy::HoldPeriod,
        "indicator_gated" => {
            let defaults = GatedParams::default();
            let params = GatedParams {
                rsi_oversold: config.get_double("strategy", "rsi_oversold", defaults.rsi_oversold),
                take_profit_pct: config.get_double(
                    "strategy",
                    "take_profit_pct",
                    defaults.take_profit_pct,
                ),
                stop_loss_pct: config.get_double(
                    "strategy",
                    "stop_loss_pct",
                    defaults.stop_loss_pct,
                ),
            };
            if !(0.0..=100.0).contains(&params.rsi_oversold) {
                return Err(invalid("strategy", "rsi_oversold", "must be in [0, 100]"));
            }
            if params.take_profit_pct <= 0.0 {
                return Err(invalid("strategy", "take_profit_pct", "must be positive"));
            }
            if params.stop_loss_pct <= 0.0 || params.stop_loss_pct >= 1.0 {
                return Err(invalid("strategy", "stop_loss_pct", "must be in (0, 1)"));
            }
            TradePolicy::IndicatorGated(params)
        }
        other => {
            return Err(invalid(
                "strategy",
                "policy",
                &format!("unknown policy '{other}', expected hold_period or indicator_gated"),
            ));
        }
    };

    Ok(StrategyConfig {
        policy,
        breakeven_is_win: config.get_bool("strategy", "breakeven_is_win", false),
    })
}

pub fn build_classifier_config(config: &dyn ConfigPort) -> Result<ClassifierConfig, PipelineError> {
    let defaults = ClassifierConfig::default();

    let test_fraction = config.get_double("ml", "test_fraction", defaults.test_fraction);
    if test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(invalid("ml", "test_fraction", "must be in (0, 1)"));
    }

    let max_depth = config.get_int("ml", "max_depth", defaults.max_depth as i64);
    if max_depth < 1 {
        return Err(invalid("ml", "max_depth", "must be at least 1"));
    }

    let min_samples_split =
        config.get_int("ml", "min_samples_split", defaults.min_samples_split as i64);
    if min_samples_split < 2 {
        return Err(invalid("ml", "min_samples_split", "must be at least 2"));
    }

    Ok(ClassifierConfig {
        test_fraction,
        max_depth: max_depth as usize,
        min_samples_split: min_samples_split as usize,
        min_samples_leaf: config.get_int("ml", "min_samples_leaf", defaults.min_samples_leaf as i64)
            as usize,
        seed: config.get_int("ml", "seed", defaults.seed as i64) as u64,
    })
}

/// Settings consumed by the market data adapter.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_key: String,
    pub retry_max: u32,
    pub retry_base_delay_secs: u64,
}

pub fn build_fetch_settings(config: &dyn ConfigPort) -> Result<FetchSettings, PipelineError> {
    let api_key = require_string(config, "data", "api_key")?;

    let retry_max = config.get_int("data", "retry_max", DEFAULT_RETRY_MAX);
    if retry_max < 1 {
        return Err(invalid("data", "retry_max", "must be at least 1"));
    }

    let retry_base_delay_secs = config.get_int(
        "data",
        "retry_base_delay_secs",
        DEFAULT_RETRY_BASE_DELAY_SECS,
    );
    if retry_base_delay_secs < 0 {
        return Err(invalid("data", "retry_base_delay_secs", "must not be negative"));
    }

    Ok(FetchSettings {
        api_key,
        retry_max: retry_max as u32,
        retry_base_delay_secs: retry_base_delay_secs as u64,
    })
}

/// Reporting destination selected in `[report] mode`.
#[derive(Debug, Clone)]
pub enum ReportSettings {
    Csv { output_dir: String },
    Sheets { spreadsheet_id: String, access_token: String },
}

pub fn build_report_settings(config: &dyn ConfigPort) -> Result<ReportSettings, PipelineError> {
    let mode = config
        .get_string("report", "mode")
        .unwrap_or_else(|| "csv".to_string());

    match mode.as_str() {
        "csv" => Ok(ReportSettings::Csv {
            output_dir: config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| "reports".to_string()),
        }),
        "sheets" => Ok(ReportSettings::Sheets {
            spreadsheet_id: require_string(config, "report", "spreadsheet_id")?,
            access_token: require_string(config, "report", "access_token")?,
        }),
        other => Err(invalid(
            "report",
            "mode",
            &format!("unknown mode '{other}', expected csv or sheets"),
        )),
    }
}

/// Validate everything a `run` needs, reporting the first problem found.
pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    build_fetch_settings(config)?;
    build_run_config(config)?;
    build_report_settings(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory config for tests.
    struct MapConfig {
        entries: HashMap<(String, String), String>,
    }

    impl MapConfig {
        fn new(pairs: &[(&str, &str, &str)]) -> Self {
            let entries = pairs
                .iter()
                .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                .collect();
            Self { entries }
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.entries
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn minimal_valid() -> MapConfig {
        MapConfig::new(&[
            ("data", "api_key", "demo"),
            ("data", "symbols", "RELIANCE.BSE,TCS.BSE"),
        ])
    }

    #[test]
    fn minimal_config_validates_with_defaults() {
        let config = minimal_valid();
        assert!(validate_run_config(&config).is_ok());

        let run = build_run_config(&config).unwrap();
        assert_eq!(run.symbols, vec!["RELIANCE.BSE", "TCS.BSE"]);
        assert_eq!(run.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert!(run.ml_enabled);
        assert!(matches!(run.strategy.policy, TradePolicy::HoldPeriod));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let config = MapConfig::new(&[("data", "symbols", "AAPL")]);
        let err = validate_run_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ConfigMissing { section, key } if section == "data" && key == "api_key"
        ));
    }

    #[test]
    fn missing_symbols_is_reported() {
        let config = MapConfig::new(&[("data", "api_key", "demo")]);
        let err = validate_run_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ConfigMissing { key, .. } if key == "symbols"
        ));
    }

    #[test]
    fn bad_symbol_list_is_invalid() {
        let config = MapConfig::new(&[
            ("data", "api_key", "demo"),
            ("data", "symbols", "AAPL,,MSFT"),
        ]);
        let err = build_run_config(&config).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigInvalid { .. }));
    }

    #[test]
    fn unknown_policy_is_invalid() {
        let config = MapConfig::new(&[
            ("data", "api_key", "demo"),
            ("data", "symbols", "AAPL"),
            ("strategy", "policy", "martingale"),
        ]);
        let err = build_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigInvalid { key, .. } if key == "policy"));
    }

    #[test]
    fn gated_policy_reads_thresholds() {
        let config = MapConfig::new(&[
            ("strategy", "policy", "indicator_gated"),
            ("strategy", "rsi_oversold", "25"),
            ("strategy", "take_profit_pct", "0.10"),
        ]);
        let strategy = build_strategy_config(&config).unwrap();
        match strategy.policy {
            TradePolicy::IndicatorGated(params) => {
                assert_eq!(params.rsi_oversold, 25.0);
                assert_eq!(params.take_profit_pct, 0.10);
                assert_eq!(params.stop_loss_pct, 0.02);
            }
            TradePolicy::HoldPeriod => panic!("expected gated policy"),
        }
    }

    #[test]
    fn gated_stop_loss_range_enforced() {
        let config = MapConfig::new(&[
            ("strategy", "policy", "indicator_gated"),
            ("strategy", "stop_loss_pct", "1.5"),
        ]);
        assert!(build_strategy_config(&config).is_err());
    }

    #[test]
    fn test_fraction_range_enforced() {
        let config = MapConfig::new(&[("ml", "test_fraction", "1.0")]);
        assert!(build_classifier_config(&config).is_err());
    }

    #[test]
    fn sheets_mode_requires_credentials() {
        let config = MapConfig::new(&[("report", "mode", "sheets")]);
        let err = build_report_settings(&config).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigMissing { .. }));
    }

    #[test]
    fn csv_mode_defaults_output_dir() {
        let config = MapConfig::new(&[]);
        match build_report_settings(&config).unwrap() {
            ReportSettings::Csv { output_dir } => assert_eq!(output_dir, "reports"),
            ReportSettings::Sheets { .. } => panic!("expected csv mode"),
        }
    }

    #[test]
    fn retry_settings_defaults_and_bounds() {
        let settings = build_fetch_settings(&minimal_valid()).unwrap();
        assert_eq!(settings.retry_max, DEFAULT_RETRY_MAX as u32);
        assert_eq!(settings.retry_base_delay_secs, DEFAULT_RETRY_BASE_DELAY_SECS as u64);

        let config = MapConfig::new(&[
            ("data", "api_key", "demo"),
            ("data", "symbols", "AAPL"),
            ("data", "retry_max", "0"),
        ]);
        assert!(build_fetch_settings(&config).is_err());
    }
}
