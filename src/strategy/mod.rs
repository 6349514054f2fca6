// Trading strategy module
pub mod orders;
pub mod parameters;
pub mod signals;
pub mod tyrion;

pub use parameters::{InputParameter, ParameterList, ParameterValue, ResolvedParameters};
pub use tyrion::{StrategyConfig, TyrionStrategy};

use crate::error::ParameterError;
use crate::indicators::{calculate_std_dev, calculate_stochastic_d, RollingSeries};
use crate::models::{Bar, OrderIntent};
use std::collections::BTreeMap;

/// Base trait for all host-driven strategies
///
/// The host calls `declare_parameters` once at setup, `initialize` once with
/// the resolved values, then `on_new_bar` once per bar in chronological order.
pub trait Strategy: Send + Sync {
    /// Parameter schema with defaults, exposed before any override
    fn declare_parameters(&self) -> ParameterList;

    /// Receive resolved parameters and register the indicators the host must maintain
    fn initialize(
        &mut self,
        params: &ResolvedParameters,
        indicators: &mut IndicatorRegistry,
    ) -> Result<(), ParameterError>;

    /// Decide which orders to submit for the bar that just closed
    fn on_new_bar(&self, ctx: &BarContext<'_>) -> Vec<OrderIntent>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Flatten any open position at the end of each trading session
    fn force_close_intraday(&self) -> bool {
        false
    }

    /// Maximum open position size in contracts, either side
    fn max_open_position(&self) -> u32 {
        1
    }

    /// Allow entry and contingent exit orders to be working at the same time
    fn uses_advanced_order_management(&self) -> bool {
        false
    }
}

/// Indicator the host recomputes on every new bar
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSpec {
    /// Stochastic %D over `period` bars
    StochasticD { period: usize },
    /// Standard deviation of closes over `period` bars, scaled by `deviations`
    StdDev { period: usize, deviations: f64 },
}

impl IndicatorSpec {
    /// Value at the latest bar of `bars`, `None` during warm-up
    pub fn compute(&self, bars: &[Bar]) -> Option<f64> {
        match self {
            IndicatorSpec::StochasticD { period } => calculate_stochastic_d(bars, *period),
            IndicatorSpec::StdDev { period, deviations } => {
                let closes: Vec<f64> = bars[bars.len().saturating_sub(*period)..]
                    .iter()
                    .map(|b| b.close)
                    .collect();
                calculate_std_dev(&closes, *period, *deviations)
            }
        }
    }

    /// Bars needed before the first value exists
    pub fn warmup_bars(&self) -> usize {
        match self {
            IndicatorSpec::StochasticD { period } => {
                period + crate::indicators::D_SMOOTHING_PERIOD - 1
            }
            IndicatorSpec::StdDev { period, .. } => *period,
        }
    }
}

/// Named indicators registered by a strategy during `initialize`
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    specs: BTreeMap<String, IndicatorSpec>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator under `name`, replacing any previous one
    pub fn add(&mut self, name: &str, spec: IndicatorSpec) {
        self.specs.insert(name.to_string(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSpec> {
        self.specs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorSpec)> {
        self.specs.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Bars of history needed before every registered indicator has a value
    pub fn warmup_bars(&self) -> usize {
        self.specs
            .values()
            .map(IndicatorSpec::warmup_bars)
            .max()
            .unwrap_or(0)
    }
}

/// Current values of every registered indicator, maintained by the host
#[derive(Debug, Clone, Default)]
pub struct IndicatorState {
    series: BTreeMap<String, RollingSeries>,
}

impl IndicatorState {
    /// Values kept per series; strategies only read the current and previous bar
    pub const HISTORY: usize = 2;

    pub fn new(registry: &IndicatorRegistry) -> Self {
        let series = registry
            .iter()
            .map(|(name, _)| (name.to_string(), RollingSeries::new(Self::HISTORY)))
            .collect();
        Self { series }
    }

    /// Recompute every registered indicator for the latest bar of `bars`
    pub fn update(&mut self, registry: &IndicatorRegistry, bars: &[Bar]) {
        for (name, spec) in registry.iter() {
            if let Some(value) = spec.compute(bars) {
                self.series
                    .entry(name.to_string())
                    .or_insert_with(|| RollingSeries::new(Self::HISTORY))
                    .push(value);
            }
        }
    }

    pub fn series(&self, name: &str) -> Option<&RollingSeries> {
        self.series.get(name)
    }

    /// Every series holds at least a current and a previous value
    pub fn is_ready(&self) -> bool {
        self.series.values().all(|s| s.len() >= Self::HISTORY)
    }
}

/// Everything a strategy sees for one bar
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    /// Bar history up to and including the current bar, oldest first
    pub bars: &'a [Bar],
    pub indicators: &'a IndicatorState,
    /// Signed open quantity owned by the host
    pub position: i64,
}

impl<'a> BarContext<'a> {
    pub fn current_bar(&self) -> Option<&'a Bar> {
        self.bars.last()
    }

    /// Close `bars_ago` bars back from the current bar
    pub fn close(&self, bars_ago: usize) -> Option<f64> {
        let len = self.bars.len();
        if bars_ago >= len {
            return None;
        }
        Some(self.bars[len - 1 - bars_ago].close)
    }

    /// Value of indicator `name`, `bars_ago` bars back
    pub fn indicator(&self, name: &str, bars_ago: usize) -> Option<f64> {
        self.indicators.series(name)?.ago(bars_ago)
    }
}
