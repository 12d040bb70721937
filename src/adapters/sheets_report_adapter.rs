//! Google Sheets report adapter.
//!
//! Talks to the Sheets values API directly: for each worksheet a
//! `values:clear` wipes prior contents, then a RAW `values:update` writes the
//! table starting at A1. Credential acquisition is out of scope; the adapter
//! is handed a ready OAuth bearer token and the spreadsheet id.

use crate::adapters::report_tables::{
    pnl_summary_rows, trade_log_rows, win_ratio_rows, PNL_SUMMARY_TABLE, TRADE_LOG_TABLE,
    WIN_RATIO_TABLE,
};
use crate::domain::backtest::BacktestResult;
use crate::domain::error::PipelineError;
use crate::ports::report_port::ReportPort;
use serde_json::json;
use tracing::info;

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsReportAdapter {
    client: reqwest::blocking::Client,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsReportAdapter {
    pub fn new(spreadsheet_id: String, access_token: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            spreadsheet_id,
            access_token,
        }
    }

    fn clear_sheet(&self, sheet: &str) -> Result<(), PipelineError> {
        let url = format!(
            "{}/{}/values/{}:clear",
            BASE_URL,
            self.spreadsheet_id,
            encode_range(sheet)
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({}))
            .send()
            .map_err(|e| reporting_error(sheet, "clear", &e.to_string()))?;

        if !response.status().is_success() {
            return Err(reporting_error(
                sheet,
                "clear",
                &format!("HTTP status {}", response.status()),
            ));
        }
        Ok(())
    }

    fn update_sheet(&self, sheet: &str, rows: &[Vec<String>]) -> Result<(), PipelineError> {
        let range = format!("{sheet}!A1");
        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            BASE_URL,
            self.spreadsheet_id,
            encode_range(&range)
        );
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|e| reporting_error(sheet, "update", &e.to_string()))?;

        if !response.status().is_success() {
            return Err(reporting_error(
                sheet,
                "update",
                &format!("HTTP status {}", response.status()),
            ));
        }

        info!(sheet, rows = rows.len(), "worksheet updated");
        Ok(())
    }
}

impl ReportPort for SheetsReportAdapter {
    fn write(&self, results: &[BacktestResult]) -> Result<(), PipelineError> {
        let tables = [
            (TRADE_LOG_TABLE, trade_log_rows(results)),
            (PNL_SUMMARY_TABLE, pnl_summary_rows(results)),
            (WIN_RATIO_TABLE, win_ratio_rows(results)),
        ];

        for (sheet, rows) in &tables {
            self.clear_sheet(sheet)?;
            self.update_sheet(sheet, rows)?;
        }

        info!(spreadsheet = %self.spreadsheet_id, "all worksheets updated");
        Ok(())
    }
}

fn reporting_error(sheet: &str, action: &str, reason: &str) -> PipelineError {
    PipelineError::Reporting {
        reason: format!("{action} failed for worksheet '{sheet}': {reason}"),
    }
}

/// Percent-encode the characters a sheet range can contain that are not safe
/// in a URL path segment (spaces, `!`, `&`).
fn encode_range(range: &str) -> String {
    let mut encoded = String::with_capacity(range.len());
    for c in range.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '!' => encoded.push_str("%21"),
            '&' => encoded.push_str("%26"),
            _ => encoded.push(c),
        }
    }
    encoded
}
