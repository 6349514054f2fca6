// Core modules
pub mod backtest;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod models;
pub mod strategy;

// Re-export commonly used types
pub use error::{BacktestError, DataError, ParameterError};
pub use models::*;
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
