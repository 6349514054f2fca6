use super::{BarSource, HistoryRequest};
use crate::error::DataError;
use crate::models::Bar;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Session hours (UTC) used for generated bars
pub const SESSION_OPEN_HOUR: u32 = 8;
pub const SESSION_CLOSE_HOUR: u32 = 22;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Sideways/choppy market around the starting price
    Sideways,
    /// High volatility, large swings
    Volatile,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 4] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
    ];
}

impl std::str::FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptrend" => Ok(MarketScenario::Uptrend),
            "downtrend" => Ok(MarketScenario::Downtrend),
            "sideways" => Ok(MarketScenario::Sideways),
            "volatile" => Ok(MarketScenario::Volatile),
            other => Err(format!(
                "unknown scenario '{}', expected uptrend, downtrend, sideways or volatile",
                other
            )),
        }
    }
}

/// Generates synthetic intraday bars for backtesting
///
/// Bars only exist inside weekday sessions, so every calendar day is one
/// trading session.
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 15_000.0,
            base_volume: 1_000.0,
        }
    }

    /// Generate bars for every session slot between `start` and `end`
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `interval_minutes` - Bar length; a session holds as many whole bars as fit
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Vec<Bar> {
        let interval = Duration::minutes(interval_minutes.max(1) as i64);
        let session_open = NaiveTime::from_hms_opt(SESSION_OPEN_HOUR, 0, 0).unwrap_or_default();
        let session_length = Duration::hours((SESSION_CLOSE_HOUR - SESSION_OPEN_HOUR) as i64);

        let mut bars = Vec::new();
        let mut price = self.base_price;
        let mut day = start.date_naive();

        while day <= end.date_naive() {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                let open_time = day.and_time(session_open).and_utc();
                let mut slot = open_time;

                while slot + interval <= open_time + session_length {
                    if slot >= start && slot <= end {
                        let open = price;
                        price = self.next_price(scenario, price);
                        bars.push(self.create_bar(open, price, slot));
                    }
                    slot = slot + interval;
                }
            }

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        bars
    }

    /// Close of the next bar given the previous close
    fn next_price(&mut self, scenario: MarketScenario, price: f64) -> f64 {
        let next = match scenario {
            MarketScenario::Uptrend => {
                price * (1.0 + 0.0004 + self.rng.gen_range(-0.003..0.003))
            }
            MarketScenario::Downtrend => {
                price * (1.0 - 0.0004 + self.rng.gen_range(-0.003..0.003))
            }
            MarketScenario::Sideways => {
                // Mean reversion force + noise
                let reversion = (self.base_price - price) * 0.05;
                price + reversion + price * self.rng.gen_range(-0.004..0.004)
            }
            MarketScenario::Volatile => price * (1.0 + self.rng.gen_range(-0.015..0.015)),
        };

        // Prevent price from going too low
        next.max(self.base_price * 0.2)
    }

    /// Helper to create a bar that opens at `open` and closes at `close`
    fn create_bar(&mut self, open: f64, close: f64, timestamp: DateTime<Utc>) -> Bar {
        // ±0.2% intrabar movement beyond the body
        let noise_pct = 0.002;

        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..noise_pct));

        // Vary volume ±30%
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// `BarSource` backed by the synthetic generator
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub seed: u64,
    pub scenario: MarketScenario,
}

impl SyntheticSource {
    pub fn new(seed: u64, scenario: MarketScenario) -> Self {
        Self { seed, scenario }
    }
}

impl BarSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic {:?} (seed {})", self.scenario, self.seed)
    }

    fn load_bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, DataError> {
        let bars = SyntheticDataGenerator::new(self.seed).generate(
            self.scenario,
            request.start,
            request.end,
            request.bar_period_minutes,
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
