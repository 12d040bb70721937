//! Alpha Vantage daily-series data adapter.
//!
//! Fetches `TIME_SERIES_DAILY` over HTTPS and decodes the JSON payload into
//! price bars. The provider signals rate limiting with a `"Note"` field and
//! unknown symbols with an `"Error Message"` field; both are classified here.
//! Rate-limit retries are bounded: exponential backoff starting at the
//! configured base delay, giving up with `RetriesExhausted` after the
//! configured number of attempts.

use crate::domain::error::PipelineError;
use crate::domain::ohlcv::{ensure_ordered, PriceBar};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the next attempt: base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(60),
        }
    }
}

pub struct AlphaVantageAdapter {
    client: reqwest::blocking::Client,
    api_key: String,
    retry: RetryPolicy,
}

impl AlphaVantageAdapter {
    pub fn new(api_key: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            retry,
        }
    }

    fn fetch_once(&self, symbol: &str) -> Result<Vec<PriceBar>, PipelineError> {
        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", &self.api_key),
            ])
            .send()
            .map_err(|e| PipelineError::Transport {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Transport {
                symbol: symbol.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let body = response.text().map_err(|e| PipelineError::Transport {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

        parse_daily_response(symbol, &body)
    }
}

impl MarketDataPort for AlphaVantageAdapter {
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PriceBar>, PipelineError> {
        info!(symbol, "fetching daily series");
        fetch_with_retry(symbol, &self.retry, || self.fetch_once(symbol))
    }
}

/// Retry `fetch` while it reports rate limiting, backing off exponentially,
/// until the allowed attempts run out.
fn fetch_with_retry<F>(
    symbol: &str,
    retry: &RetryPolicy,
    fetch: F,
) -> Result<Vec<PriceBar>, PipelineError>
where
    F: Fn() -> Result<Vec<PriceBar>, PipelineError>,
{
    for attempt in 0..retry.max_attempts {
        match fetch() {
            Err(PipelineError::RateLimited { .. }) => {
                let delay = retry.delay_for(attempt);
                warn!(
                    symbol,
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs(),
                    "rate limited, backing off"
                );
                std::thread::sleep(delay);
            }
            other => return other,
        }
    }

    Err(PipelineError::RetriesExhausted {
        symbol: symbol.to_string(),
        attempts: retry.max_attempts,
    })
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    // BTreeMap keys are ISO dates, so iteration is already chronological.
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyFields>>,
}

#[derive(Debug, Deserialize)]
struct DailyFields {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Decode one `TIME_SERIES_DAILY` response body into sorted bars.
pub fn parse_daily_response(symbol: &str, body: &str) -> Result<Vec<PriceBar>, PipelineError> {
    let payload: DailyResponse =
        serde_json::from_str(body).map_err(|e| PipelineError::Transport {
            symbol: symbol.to_string(),
            reason: format!("JSON decode error: {e}"),
        })?;

    if payload.note.is_some() {
        return Err(PipelineError::RateLimited {
            symbol: symbol.to_string(),
        });
    }
    if payload.error_message.is_some() {
        return Err(PipelineError::NotFound {
            symbol: symbol.to_string(),
        });
    }

    let Some(time_series) = payload.time_series else {
        return Err(PipelineError::NotFound {
            symbol: symbol.to_string(),
        });
    };

    let mut bars = Vec::with_capacity(time_series.len());
    for (date_str, fields) in &time_series {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            PipelineError::Transport {
                symbol: symbol.to_string(),
                reason: format!("invalid date {date_str}: {e}"),
            }
        })?;

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            open: field_f64(symbol, &fields.open, "1. open")?,
            high: field_f64(symbol, &fields.high, "2. high")?,
            low: field_f64(symbol, &fields.low, "3. low")?,
            close: field_f64(symbol, &fields.close, "4. close")?,
            volume: field_f64(symbol, &fields.volume, "5. volume")? as i64,
        });
    }

    ensure_ordered(&bars)?;
    Ok(bars)
}

fn field_f64(symbol: &str, raw: &str, key: &str) -> Result<f64, PipelineError> {
    raw.parse::<f64>().map_err(|_| PipelineError::Transport {
        symbol: symbol.to_string(),
        reason: format!("malformed field {key}: '{raw}'"),
    })
}
