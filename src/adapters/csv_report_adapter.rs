//! CSV workbook report adapter.
//!
//! Writes the three result tables as CSV files under a target directory, one
//! file per table, overwriting whatever a previous run left behind.

use crate::adapters::report_tables::{pnl_summary_rows, trade_log_rows, win_ratio_rows};
use crate::domain::backtest::BacktestResult;
use crate::domain::error::PipelineError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub const TRADE_LOG_FILE: &str = "trade_log.csv";
pub const PNL_SUMMARY_FILE: &str = "pnl_summary.csv";
pub const WIN_RATIO_FILE: &str = "win_ratio.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn write_table(&self, file_name: &str, rows: &[Vec<String>]) -> Result<(), PipelineError> {
        let path = self.output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| PipelineError::Reporting {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        for row in rows {
            writer.write_record(row).map_err(|e| PipelineError::Reporting {
                reason: format!("failed to write {}: {}", path.display(), e),
            })?;
        }

        writer.flush().map_err(|e| PipelineError::Reporting {
            reason: format!("failed to flush {}: {}", path.display(), e),
        })?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, results: &[BacktestResult]) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| PipelineError::Reporting {
            reason: format!(
                "failed to create {}: {}",
                self.output_dir.display(),
                e
            ),
        })?;

        self.write_table(TRADE_LOG_FILE, &trade_log_rows(results))?;
        self.write_table(PNL_SUMMARY_FILE, &pnl_summary_rows(results))?;
        self.write_table(WIN_RATIO_FILE, &win_ratio_rows(results))?;

        info!(dir = %self.output_dir.display(), symbols = results.len(), "CSV report written");
        Ok(())
    }
}
