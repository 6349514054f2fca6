// Run settings for the backtest bootstrap
use crate::backtest::{ExecutionCosts, SessionCalendar};
use crate::error::ParameterError;
use crate::market_data::{
    BarSource, HistoryRequest, JsonFileSource, MarketScenario, SyntheticSource,
};
use crate::strategy::parameters::parse_override;
use chrono::{DateTime, Months, NaiveDate, Utc};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override settings, e.g. `TYRION_SYMBOL`
pub const ENV_PREFIX: &str = "TYRION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Synthetic,
    JsonFile,
}

/// Where historical bars come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub kind: DataKind,
    /// Bar file for `json_file`
    pub path: Option<PathBuf>,
    pub seed: u64,
    pub scenario: MarketScenario,
}

impl DataSettings {
    pub fn build_source(&self) -> crate::Result<Box<dyn BarSource>> {
        match self.kind {
            DataKind::Synthetic => Ok(Box::new(SyntheticSource::new(self.seed, self.scenario))),
            DataKind::JsonFile => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or("data.path is required when data.kind = json_file")?;
                Ok(Box::new(JsonFileSource::new(path)))
            }
        }
    }
}

/// Everything the bootstrap needs to run one backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub symbol: String,
    pub bar_period_minutes: u32,
    pub lookback_months: u32,
    /// Gap beyond one bar step that separates two trading sessions
    pub session_break_minutes: u32,
    pub initial_capital: f64,
    pub point_value: f64,
    pub commission_per_contract: f64,
    /// Broker credentials; only checked for presence
    pub api_login: Option<String>,
    pub api_password: Option<String>,
    /// Trading API and historical-data server endpoints; reported, never contacted
    pub api_url: Option<String>,
    pub history_url: Option<String>,
    pub data: DataSettings,
    /// Strategy parameter overrides as `NAME=VALUE`
    pub parameters: Vec<String>,
}

impl Settings {
    /// Load settings from defaults, an optional file, then `TYRION_*` variables
    ///
    /// Nested keys use a double underscore: `TYRION_DATA__KIND=json_file`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("symbol", "FDAX")?
            .set_default("bar_period_minutes", 60)?
            .set_default("lookback_months", 6)?
            .set_default(
                "session_break_minutes",
                SessionCalendar::DEFAULT_BREAK_MINUTES as i64,
            )?
            .set_default("initial_capital", 10_000.0)?
            .set_default("point_value", 25.0)?
            .set_default("commission_per_contract", 0.0)?
            .set_default("data.kind", "synthetic")?
            .set_default("data.seed", 42)?
            .set_default("data.scenario", "sideways")?
            .set_default("parameters", Vec::<String>::new())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("parameters")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn parameter_overrides(&self) -> Result<HashMap<String, f64>, ParameterError> {
        self.parameters
            .iter()
            .map(|raw| parse_override(raw))
            .collect()
    }

    pub fn execution_costs(&self) -> ExecutionCosts {
        ExecutionCosts {
            point_value: self.point_value,
            commission_per_contract: self.commission_per_contract,
        }
    }

    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.api_login) && present(&self.api_password)
    }

    /// One line per configured connection detail, secrets masked
    pub fn connection_summary(&self) -> Vec<String> {
        let endpoint = |name: &str, url: &Option<String>| match url.as_deref() {
            Some(url) if !url.is_empty() => format!("{}: {}", name, url),
            _ => format!("{}: not configured", name),
        };
        let login = match self.api_login.as_deref() {
            Some(login) if !login.is_empty() => login,
            _ => "not configured",
        };
        let password = if self.has_credentials() {
            "set"
        } else {
            "missing"
        };

        vec![
            endpoint("Trading API", &self.api_url),
            endpoint("History server", &self.history_url),
            format!("API login: {} (password {})", login, password),
        ]
    }

    pub fn session_calendar(&self) -> SessionCalendar {
        SessionCalendar::new(self.bar_period_minutes, self.session_break_minutes)
    }

    pub fn history_request(&self, window: &BacktestWindow) -> HistoryRequest {
        HistoryRequest {
            symbol: self.symbol.clone(),
            bar_period_minutes: self.bar_period_minutes,
            start: window.start,
            end: window.end,
        }
    }
}

/// Inclusive time range of a backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BacktestWindow {
    /// `months` of history ending yesterday
    ///
    /// Starts at midnight of `today - months - 1 day` and ends at 23:59:59
    /// of yesterday. Returns `None` if the dates fall outside chrono's range.
    pub fn ending_yesterday(today: NaiveDate, months: u32) -> Option<Self> {
        let yesterday = today.pred_opt()?;
        let first_day = today.checked_sub_months(Months::new(months))?.pred_opt()?;

        Some(Self {
            start: first_day.and_hms_opt(0, 0, 0)?.and_utc(),
            end: yesterday.and_hms_opt(23, 59, 59)?.and_utc(),
        })
    }
}
