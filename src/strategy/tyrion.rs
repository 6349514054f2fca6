use super::{
    orders::plan,
    parameters::{InputParameter, ParameterList, ParameterValue, ResolvedParameters},
    signals::evaluate,
    BarContext, IndicatorRegistry, IndicatorSpec, Strategy,
};
use crate::error::ParameterError;
use crate::models::OrderIntent;
use serde::{Deserialize, Serialize};

pub const STD_DEV_PERIOD: &str = "StdDev Period";
pub const STD_DEV_DEVIATIONS: &str = "StdDev Number of Deviations";
pub const STOCHASTIC_PERIOD: &str = "Stochastic Period";
pub const BUY_TRIGGER_LEVEL: &str = "Stochastic %D Buy signal trigger level";

/// Names the indicators are registered under
pub const STD_DEV_INDICATOR: &str = "Std Dev indicator";
pub const STOCHASTIC_INDICATOR: &str = "Stochastic";

/// Tunable parameters, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub std_dev_period: usize,
    pub std_dev_deviations: f64,
    pub stochastic_period: usize,
    pub buy_trigger_level: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            std_dev_period: 20,
            std_dev_deviations: 3.0,
            stochastic_period: 77,
            buy_trigger_level: 51.0,
        }
    }
}

impl StrategyConfig {
    /// Build and validate a config from resolved parameter values
    pub fn from_parameters(params: &ResolvedParameters) -> Result<Self, ParameterError> {
        let std_dev_deviations = params.get_f64(STD_DEV_DEVIATIONS)?;
        if std_dev_deviations <= 0.0 {
            return Err(ParameterError::OutOfRange {
                name: STD_DEV_DEVIATIONS.to_string(),
                value: std_dev_deviations,
                reason: "must be positive",
            });
        }

        Ok(Self {
            std_dev_period: params.get_period(STD_DEV_PERIOD)?,
            std_dev_deviations,
            stochastic_period: params.get_period(STOCHASTIC_PERIOD)?,
            buy_trigger_level: params.get_f64(BUY_TRIGGER_LEVEL)?,
        })
    }
}

/// Tyrion trading rules
///
/// - Entry: Stochastic %D crosses the buy trigger level upwards while flat
/// - Exit: take-profit limit one StdDev band above the entry bar's close
/// - Filters: none; positions are closed at the end of each session
#[derive(Debug, Clone, Default)]
pub struct TyrionStrategy {
    config: StrategyConfig,
}

impl TyrionStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

impl Strategy for TyrionStrategy {
    fn declare_parameters(&self) -> ParameterList {
        let defaults = StrategyConfig::default();
        let mut parameters = ParameterList::new();

        parameters.add(InputParameter::new(
            STD_DEV_PERIOD,
            ParameterValue::Integer(defaults.std_dev_period as i64),
        ));
        parameters.add(InputParameter::new(
            STD_DEV_DEVIATIONS,
            ParameterValue::Decimal(defaults.std_dev_deviations),
        ));
        parameters.add(InputParameter::new(
            STOCHASTIC_PERIOD,
            ParameterValue::Integer(defaults.stochastic_period as i64),
        ));
        parameters.add(InputParameter::new(
            BUY_TRIGGER_LEVEL,
            ParameterValue::Decimal(defaults.buy_trigger_level),
        ));

        parameters
    }

    fn initialize(
        &mut self,
        params: &ResolvedParameters,
        indicators: &mut IndicatorRegistry,
    ) -> Result<(), ParameterError> {
        self.config = StrategyConfig::from_parameters(params)?;
        tracing::debug!("Tyrion initialize: {:?}", self.config);

        indicators.add(
            STD_DEV_INDICATOR,
            IndicatorSpec::StdDev {
                period: self.config.std_dev_period,
                deviations: self.config.std_dev_deviations,
            },
        );
        indicators.add(
            STOCHASTIC_INDICATOR,
            IndicatorSpec::StochasticD {
                period: self.config.stochastic_period,
            },
        );

        Ok(())
    }

    fn on_new_bar(&self, ctx: &BarContext<'_>) -> Vec<OrderIntent> {
        let (Some(d_prev), Some(d_curr)) = (
            ctx.indicator(STOCHASTIC_INDICATOR, 1),
            ctx.indicator(STOCHASTIC_INDICATOR, 0),
        ) else {
            return Vec::new();
        };

        let Some(signal) = evaluate(ctx.position, d_prev, d_curr, self.config.buy_trigger_level)
        else {
            return Vec::new();
        };

        let (Some(close), Some(std_dev)) = (ctx.close(0), ctx.indicator(STD_DEV_INDICATOR, 0))
        else {
            return Vec::new();
        };

        let (entry, take_profit) = plan(&signal, close, std_dev);
        tracing::info!(
            "BUY signal: %D {:.2} -> {:.2} over {:.2}, take profit @ {:.2}",
            d_prev,
            d_curr,
            signal.trigger_level,
            close + std_dev
        );

        vec![entry, take_profit]
    }

    fn name(&self) -> &str {
        "Tyrion Strategy"
    }

    fn force_close_intraday(&self) -> bool {
        true
    }

    fn max_open_position(&self) -> u32 {
        1
    }

    fn uses_advanced_order_management(&self) -> bool {
        true
    }
}
