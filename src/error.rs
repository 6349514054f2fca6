use thiserror::Error;

/// Problems resolving or validating strategy input parameters
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("parameter '{0}' has no resolved value")]
    Missing(String),

    #[error("parameter '{name}' expects an integer, got {value}")]
    NotAnInteger { name: String, value: f64 },

    #[error("parameter '{name}' = {value} is out of range: {reason}")]
    OutOfRange {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid parameter override '{0}', expected NAME=VALUE")]
    MalformedOverride(String),
}

/// Failures loading historical bars
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read bar file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bar file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no bars for {symbol} between {start} and {end}")]
    Empty {
        symbol: String,
        start: String,
        end: String,
    },
}

/// Failures of the backtest host itself
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("Not enough bars for backtest. Need {needed}, got {got}")]
    InsufficientBars { needed: usize, got: usize },

    #[error("bars are not in chronological order at index {index}")]
    Unordered { index: usize },

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
