//! Domain error types.
//!
//! Every variant carries enough context (index, value, required vs. available)
//! to diagnose the first violation without re-running the pipeline.

use chrono::NaiveDate;

/// Top-level error type for trendvol.
#[derive(Debug, thiserror::Error)]
pub enum TrendvolError {
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

    #[error("insufficient data for {context}: have {available} observations, need {required}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    #[error("empty price series for {symbol}")]
    EmptySeries { symbol: String },

    #[error("non-monotonic timestamp in {symbol} at index {index}: {current} does not follow {previous}")]
    NonMonotonicTimestamp {
        symbol: String,
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("non-positive price in {symbol} at index {index}: {price}")]
    NonPositivePrice {
        symbol: String,
        index: usize,
        price: f64,
    },

    #[error("non-finite value in {symbol} at index {index}: {value}")]
    NonFiniteValue {
        symbol: String,
        index: usize,
        value: f64,
    },

    #[error("misaligned series for asset {asset} at index {index}: {reason}")]
    MisalignedSeries {
        asset: String,
        index: usize,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("order execution error: {reason}")]
    Execution { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendvolError {
    /// Shorthand for a `ConfigInvalid` error.
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TrendvolError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Short kind label surfaced by the reporting layer.
    pub fn kind(&self) -> &'static str {
        match self {
            TrendvolError::ConfigParse { .. }
            | TrendvolError::ConfigMissing { .. }
            | TrendvolError::ConfigInvalid { .. } => "ConfigurationError",
            TrendvolError::InsufficientData { .. } => "InsufficientDataError",
            TrendvolError::EmptySeries { .. }
            | TrendvolError::NonMonotonicTimestamp { .. }
            | TrendvolError::NonPositivePrice { .. }
            | TrendvolError::NonFiniteValue { .. }
            | TrendvolError::MisalignedSeries { .. } => "DataIntegrityError",
            TrendvolError::DataSource { .. } => "DataSourceError",
            TrendvolError::Execution { .. } => "ExecutionError",
            TrendvolError::Io(_) => "IoError",
        }
    }
}

impl From<&TrendvolError> for std::process::ExitCode {
    fn from(err: &TrendvolError) -> Self {
        let code: u8 = match err {
            TrendvolError::Io(_) => 1,
            TrendvolError::ConfigParse { .. }
            | TrendvolError::ConfigMissing { .. }
            | TrendvolError::ConfigInvalid { .. } => 2,
            TrendvolError::DataSource { .. } => 3,
            TrendvolError::InsufficientData { .. }
            | TrendvolError::EmptySeries { .. }
            | TrendvolError::NonMonotonicTimestamp { .. }
            | TrendvolError::NonPositivePrice { .. }
            | TrendvolError::NonFiniteValue { .. }
            | TrendvolError::MisalignedSeries { .. } => 5,
            TrendvolError::Execution { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
