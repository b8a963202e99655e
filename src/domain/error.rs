//! Domain error types.

/// Why a raw row was rejected by a record source.
///
/// Malformed rows are recovered locally: the source logs the reason and
/// moves on to the next row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("missing {column} column")]
    MissingColumn { column: &'static str },

    #[error("invalid date {value:?}")]
    InvalidDate { value: String },

    #[error("invalid {column} value {value:?}")]
    InvalidNumber { column: &'static str, value: String },

    #[error("non-finite {column} value")]
    NonFinite { column: &'static str },

    #[error("non-positive close {close}")]
    NonPositiveClose { close: f64 },
}

/// Top-level error type for pricestream.
#[derive(Debug, thiserror::Error)]
pub enum PriceStreamError {
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

    #[error("no data file for {ticker}: {path} does not exist")]
    NotFound { ticker: String, path: String },

    #[error("read error on {ticker} stream: {reason}")]
    StreamIo { ticker: String, reason: String },

    #[error("output error: {reason}")]
    Output { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PriceStreamError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        PriceStreamError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_missing(section: &str, key: &str) -> Self {
        PriceStreamError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&PriceStreamError> for std::process::ExitCode {
    fn from(err: &PriceStreamError) -> Self {
        let code: u8 = match err {
            PriceStreamError::Io(_) => 1,
            PriceStreamError::ConfigParse { .. }
            | PriceStreamError::ConfigMissing { .. }
            | PriceStreamError::ConfigInvalid { .. } => 2,
            PriceStreamError::NotFound { .. } => 3,
            PriceStreamError::StreamIo { .. } => 4,
            PriceStreamError::Output { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
