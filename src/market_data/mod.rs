// Historical bar sources for the backtest host
pub mod synthetic;

pub use synthetic::{MarketScenario, SyntheticDataGenerator, SyntheticSource};

use crate::error::DataError;
use crate::models::Bar;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Instrument, bar interval and time window to load
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub bar_period_minutes: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HistoryRequest {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Anything that can deliver chronological bars for a request
pub trait BarSource {
    /// Short description for logs
    fn describe(&self) -> String;

    fn load_bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, DataError>;
}

/// Bars stored as a JSON array on disk
///
/// ```json
/// [{"timestamp":"2024-03-04T08:00:00Z","open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":10.0}]
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BarSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }

    fn load_bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, DataError> {
        let path = self.path.display().to_string();
        let raw = std::fs::read_to_string(&self.path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        let all: Vec<Bar> =
            serde_json::from_str(&raw).map_err(|source| DataError::Parse { path, source })?;

        let total = all.len();
        let mut bars: Vec<Bar> = all
            .into_iter()
            .filter(|bar| request.contains(bar.timestamp))
            .collect();
        bars.sort_by_key(|bar| bar.timestamp);

        tracing::debug!(
            "Loaded {} of {} bars from {} for {}",
            bars.len(),
            total,
            self.path.display(),
            request.symbol
        );

        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: request.symbol.clone(),
                start: request.start.to_rfc3339(),
                end: request.end.to_rfc3339(),
            });
        }

        Ok(bars)
    }
}
