//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::alpha_vantage_adapter::{AlphaVantageAdapter, RetryPolicy};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sheets_report_adapter::SheetsReportAdapter;
use crate::adapters::telegram_adapter::TelegramAdapter;
use crate::domain::backtest::BacktestResult;
use crate::domain::config_validation::{
    build_fetch_settings, build_report_settings, build_run_config, validate_run_config,
    FetchSettings, ReportSettings,
};
use crate::domain::error::PipelineError;
use crate::domain::pipeline::{fetch_all, run_backtests, run_pipeline};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Daily-bar paper trading pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, backtest, report and alert in one run
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Fetch and backtest only, printing results to stdout
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict the run to a single symbol
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config } => run_full(&config),
        Command::Backtest { config, symbol } => run_backtest_only(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PipelineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn build_report_adapter(config: &dyn ConfigPort) -> Result<Box<dyn ReportPort>, PipelineError> {
    match build_report_settings(config)? {
        ReportSettings::Csv { output_dir } => {
            Ok(Box::new(CsvReportAdapter::new(PathBuf::from(output_dir))))
        }
        ReportSettings::Sheets {
            spreadsheet_id,
            access_token,
        } => Ok(Box::new(SheetsReportAdapter::new(
            spreadsheet_id,
            access_token,
        ))),
    }
}

fn build_data_adapter(settings: &FetchSettings) -> AlphaVantageAdapter {
    AlphaVantageAdapter::new(
        settings.api_key.clone(),
        RetryPolicy {
            max_attempts: settings.retry_max,
            base_delay: Duration::from_secs(settings.retry_base_delay_secs),
        },
    )
}

fn build_alert_adapter(config: &dyn ConfigPort) -> Result<TelegramAdapter, PipelineError> {
    TelegramAdapter::new(
        config
            .get_string("alerts", "telegram_bot_token")
            .unwrap_or_default(),
        config
            .get_string("alerts", "telegram_chat_id")
            .unwrap_or_default(),
    )
}

fn run_full(config_path: &PathBuf) -> ExitCode {
    info!(config = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let outcome = (|| -> Result<(), PipelineError> {
        validate_run_config(&adapter)?;
        let run_config = build_run_config(&adapter)?;
        let fetch_settings = build_fetch_settings(&adapter)?;

        let data_port = build_data_adapter(&fetch_settings);
        let report_port = build_report_adapter(&adapter)?;
        let alert_port = build_alert_adapter(&adapter)?;

        let today = chrono::Local::now().date_naive();
        let summary = run_pipeline(
            &run_config,
            &data_port,
            report_port.as_ref(),
            &alert_port,
            today,
        )?;

        print_results(&summary.results);
        if !summary.report_ok {
            println!("report update failed; see log for details");
        }
        for (symbol, accuracy) in &summary.classifier_outcomes {
            match accuracy {
                Some(acc) => println!("{symbol}: classifier accuracy {acc:.2}"),
                None => println!("{symbol}: classifier skipped"),
            }
        }
        Ok(())
    })();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_backtest_only(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let outcome = (|| -> Result<(), PipelineError> {
        let mut run_config = build_run_config(&adapter)?;
        let fetch_settings = build_fetch_settings(&adapter)?;

        if let Some(symbol) = symbol_override {
            run_config.symbols = vec![symbol.to_uppercase()];
        }

        let data_port = build_data_adapter(&fetch_settings);
        let today = chrono::Local::now().date_naive();

        let data = fetch_all(
            &data_port,
            &run_config.symbols,
            today,
            run_config.lookback_days,
        );
        if data.is_empty() {
            return Err(PipelineError::NoUsableData);
        }

        let results = run_backtests(&data, &run_config.strategy);
        if results.is_empty() {
            return Err(PipelineError::NoUsableData);
        }

        print_results(&results);
        Ok(())
    })();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_run_config(&adapter) {
        Ok(()) => {
            println!("config {} is valid", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn print_results(results: &[BacktestResult]) {
    for result in results {
        println!(
            "{}: P&L {:.2}, trades {}, win ratio {:.2}% ({} won / {} lost)",
            result.symbol,
            result.total_pnl,
            result.total_trades,
            result.win_ratio,
            result.win_count,
            result.loss_count
        );
    }
}
