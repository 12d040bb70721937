//! Domain error types.

/// Top-level error type for papertrader.
///
/// Per-symbol provider failures are non-fatal: the orchestrator logs them and
/// moves on. Only `NoUsableData` (nothing fetched for any symbol) aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input series: {reason}")]
    InvalidInput { reason: String },

    #[error("no data for {symbol}")]
    NotFound { symbol: String },

    #[error("rate limited while fetching {symbol}")]
    RateLimited { symbol: String },

    #[error("rate-limit retries exhausted for {symbol} after {attempts} attempts")]
    RetriesExhausted { symbol: String, attempts: u32 },

    #[error("transport error for {symbol}: {reason}")]
    Transport { symbol: String, reason: String },

    #[error("reporting error: {reason}")]
    Reporting { reason: String },

    #[error("alert delivery error: {reason}")]
    Alert { reason: String },

    #[error("no usable data for any configured symbol")]
    NoUsableData,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PipelineError> for std::process::ExitCode {
    fn from(err: &PipelineError) -> Self {
        let code: u8 = match err {
            PipelineError::Io(_) => 1,
            PipelineError::ConfigParse { .. }
            | PipelineError::ConfigMissing { .. }
            | PipelineError::ConfigInvalid { .. } => 2,
            PipelineError::NotFound { .. }
            | PipelineError::RateLimited { .. }
            | PipelineError::RetriesExhausted { .. }
            | PipelineError::Transport { .. } => 3,
            PipelineError::Reporting { .. } | PipelineError::Alert { .. } => 4,
            PipelineError::InvalidInput { .. } => 5,
            PipelineError::NoUsableData => 6,
        };
        std::process::ExitCode::from(code)
    }
}
