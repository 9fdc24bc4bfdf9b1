//! Domain error types.

/// Top-level error type for pullback.
#[derive(Debug, thiserror::Error)]
pub enum PullbackError {
    #[error("input error: {reason}")]
    Input { reason: String },

    #[error("missing required column: {column}")]
    MissingColumn { column: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("invalid series for {code}: {reason}")]
    InvalidSeries { code: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PullbackError> for std::process::ExitCode {
    fn from(err: &PullbackError) -> Self {
        let code: u8 = match err {
            PullbackError::Io(_) => 1,
            PullbackError::ConfigParse { .. }
            | PullbackError::ConfigMissing { .. }
            | PullbackError::ConfigInvalid { .. } => 2,
            PullbackError::Input { .. } | PullbackError::MissingColumn { .. } => 3,
            PullbackError::Report { .. } => 4,
            PullbackError::InvalidSeries { .. } | PullbackError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
