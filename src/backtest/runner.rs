use super::metrics::BacktestMetrics;
use super::order_book::OrderBook;
use super::position::{ExecutionCosts, PositionTracker};
use super::session::{validate_chronological, SessionCalendar};
use crate::error::BacktestError;
use crate::models::{Bar, ExitReason};
use crate::strategy::{BarContext, IndicatorRegistry, IndicatorState, Strategy};
use std::collections::HashMap;

/// Backtest runner that drives a strategy bar by bar over historical data
///
/// Plays the host role: resolves parameters, maintains indicators, owns the
/// position and order book, and enforces the strategy's session and
/// position-size policies.
pub struct BacktestRunner {
    initial_portfolio_value: f64,
    costs: ExecutionCosts,
    sessions: SessionCalendar,
    parameter_overrides: HashMap<String, f64>,
}

impl BacktestRunner {
    /// Create a new backtest runner
    pub fn new(initial_portfolio_value: f64, costs: ExecutionCosts) -> Self {
        Self {
            initial_portfolio_value,
            costs,
            sessions: SessionCalendar::default(),
            parameter_overrides: HashMap::new(),
        }
    }

    /// Session boundaries used for intraday force-close, 60-minute bars by default
    pub fn with_sessions(mut self, sessions: SessionCalendar) -> Self {
        self.sessions = sessions;
        self
    }

    /// Override declared strategy parameters by name
    pub fn with_parameters(mut self, overrides: HashMap<String, f64>) -> Self {
        self.parameter_overrides = overrides;
        self
    }

    /// Run a backtest with given strategy and bars
    ///
    /// # Arguments
    /// * `strategy` - The strategy to test; it is initialized here
    /// * `bars` - Chronological bars, long enough to warm up every indicator
    ///
    /// # Returns
    /// BacktestMetrics with performance data
    pub fn run<S: Strategy + ?Sized>(
        &self,
        strategy: &mut S,
        bars: &[Bar],
    ) -> Result<BacktestMetrics, BacktestError> {
        let params = strategy
            .declare_parameters()
            .resolve(&self.parameter_overrides)?;
        let mut registry = IndicatorRegistry::new();
        strategy.initialize(&params, &mut registry)?;

        // One bar per indicator value plus one more for the previous value
        let bars_needed = registry.warmup_bars() + IndicatorState::HISTORY - 1;
        if bars.len() < bars_needed.max(IndicatorState::HISTORY) {
            return Err(BacktestError::InsufficientBars {
                needed: bars_needed.max(IndicatorState::HISTORY),
                got: bars.len(),
            });
        }
        validate_chronological(bars)?;

        tracing::info!(
            "Starting backtest: {} on {} bars ({} sessions), warm-up {} bars",
            strategy.name(),
            bars.len(),
            self.sessions.session_count(bars),
            bars_needed
        );

        let max_position = strategy.max_open_position();
        let force_close = strategy.force_close_intraday();
        let mut book = OrderBook::new(strategy.uses_advanced_order_management());
        let mut tracker = PositionTracker::new(self.costs);
        let mut indicators = IndicatorState::new(&registry);
        let mut orders_submitted = 0;
        let mut orders_rejected = 0;

        for (i, bar) in bars.iter().enumerate() {
            // Fill orders submitted on earlier bars FIRST
            let execution = book.process_bar(bar, i, tracker.position(), max_position);
            orders_rejected += execution.rejected;
            for fill in &execution.fills {
                tracker.apply_fill(fill);
            }

            let history = &bars[..=i];
            indicators.update(&registry, history);

            if indicators.is_ready() {
                let ctx = BarContext {
                    bars: history,
                    indicators: &indicators,
                    position: tracker.position(),
                };
                let intents = strategy.on_new_bar(&ctx);
                if !intents.is_empty() {
                    let requested = intents.len();
                    let accepted = book.submit(intents, i);
                    orders_submitted += accepted.len();
                    orders_rejected += requested - accepted.len();
                }
            }

            if force_close && self.sessions.is_session_end(bars, i) {
                book.cancel_all();
                if !tracker.is_flat() {
                    tracing::debug!("Session close {}: flattening", bar.timestamp);
                    tracker.flatten(bar.close, bar.timestamp, ExitReason::SessionClose);
                }
            }
        }

        // Close any remaining open position at final price
        if let Some(last) = bars.last() {
            tracker.flatten(last.close, last.timestamp, ExitReason::EndOfData);
        }

        let metrics = BacktestMetrics::from_trades(
            tracker.into_trades(),
            self.initial_portfolio_value,
            orders_submitted,
            orders_rejected,
        );

        tracing::info!(
            "Backtest complete: {} trades, P&L: {:.2} ({:.2}%)",
            metrics.total_trades,
            metrics.net_pnl,
            metrics.net_return_pct
        );

        Ok(metrics)
    }

    /// Run backtest and print report
    pub fn run_and_report<S: Strategy + ?Sized>(
        &self,
        strategy: &mut S,
        bars: &[Bar],
        scenario_name: &str,
    ) -> Result<BacktestMetrics, BacktestError> {
        println!("\n🔬 Running backtest: {}", scenario_name);
        println!("   Strategy: {}", strategy.name());
        println!("   Bars: {}", bars.len());
        println!("   Initial Capital: {:.2}", self.initial_portfolio_value);

        let metrics = self.run(strategy, bars)?;
        metrics.print_report();

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{MarketScenario, SyntheticDataGenerator};
    use crate::models::OrderIntent;
    use crate::strategy::tyrion::{BUY_TRIGGER_LEVEL, STD_DEV_PERIOD, STOCHASTIC_PERIOD};
    use crate::strategy::{ParameterList, ResolvedParameters, TyrionStrategy};
    use crate::ParameterError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn init_logging() {
        tracing_subscriber::fmt()
            .with_env_filter("tyrion=debug")
            .try_init()
            .ok();
    }

    fn synthetic(scenario: MarketScenario, days: i64) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(days);
        SyntheticDataGenerator::new(42).generate(scenario, start, end, 60)
    }

    fn bar(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    /// Short periods so a handful of bars produce a crossing
    fn fast_overrides() -> HashMap<String, f64> {
        HashMap::from([
            (STOCHASTIC_PERIOD.to_string(), 2.0),
            (STD_DEV_PERIOD.to_string(), 2.0),
            (BUY_TRIGGER_LEVEL.to_string(), 51.0),
        ])
    }

    /// One session: %D(2) dips then crosses 51 on the 6th bar (index 5)
    ///
    /// %K per bar: -, 50, 0, 0, 100, 100, ...
    fn crossing_session(day: u32, exit_high: f64) -> Vec<Bar> {
        let t = Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap();
        crossing_bars(t, exit_high)
    }

    /// Eight hourly bars from `t`, entry fills on the 7th
    fn crossing_bars(t: DateTime<Utc>, exit_high: f64) -> Vec<Bar> {
        let h = |n: i64| t + Duration::hours(n);
        vec![
            bar(h(0), 100.0, 102.0, 98.0, 100.0),
            bar(h(1), 100.0, 102.0, 98.0, 100.0),
            bar(h(2), 100.0, 100.0, 96.0, 96.0),
            bar(h(3), 96.0, 96.0, 94.0, 94.0),
            bar(h(4), 94.0, 100.0, 94.0, 100.0),
            bar(h(5), 100.0, 104.0, 100.0, 104.0),
            bar(h(6), 104.0, exit_high, 103.0, 105.0),
            bar(h(7), 105.0, 105.5, 104.5, 105.0),
        ]
    }

    #[test]
    fn test_take_profit_round_trip() {
        init_logging();
        let bars = crossing_session(4, 120.0);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default())
            .with_parameters(fast_overrides());
        let mut strategy = TyrionStrategy::new();

        let metrics = runner.run(&mut strategy, &bars).unwrap();

        assert_eq!(metrics.orders_submitted, 2);
        assert_eq!(metrics.total_trades, 1);
        let trade = &metrics.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        // Entry at the next open, exit at signal close + 1 StdDev band
        assert_eq!(trade.entry_price, 104.0);
        assert_eq!(trade.exit_price, 104.0 + 3.0 * 2.0);
    }

    #[test]
    fn test_session_close_flattens() {
        init_logging();
        // Take profit never reached
        let bars = crossing_session(4, 105.0);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default())
            .with_parameters(fast_overrides());
        let mut strategy = TyrionStrategy::new();

        let metrics = runner.run(&mut strategy, &bars).unwrap();

        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.trades[0].exit_reason, ExitReason::SessionClose);
        assert_eq!(metrics.trades[0].exit_price, 105.0);
        assert_eq!(metrics.session_close_exits, 1);
    }

    #[test]
    fn test_session_close_before_gap_across_utc_midnight() {
        // 13:00..20:00 UTC, then the next session opens at 23:00 the same day
        let mut bars = crossing_bars(Utc.with_ymd_and_hms(2024, 6, 3, 13, 0, 0).unwrap(), 105.0);
        let reopen = Utc.with_ymd_and_hms(2024, 6, 3, 23, 0, 0).unwrap();
        bars.push(bar(reopen, 105.0, 105.5, 104.5, 105.0));
        bars.push(bar(reopen + Duration::hours(1), 105.0, 105.5, 104.5, 105.0));

        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default())
            .with_parameters(fast_overrides())
            .with_sessions(SessionCalendar::new(60, 120));
        let metrics = runner.run(&mut TyrionStrategy::new(), &bars).unwrap();

        assert_eq!(metrics.total_trades, 1);
        let trade = &metrics.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::SessionClose);
        assert_eq!(trade.exit_time, bars[7].timestamp);
        assert_eq!(trade.exit_price, 105.0);
    }

    #[test]
    fn test_working_orders_cancelled_at_session_end() {
        // The signal bar is the last bar of the day; its orders die with the session
        let mut bars = crossing_session(4, 120.0);
        bars.truncate(6);
        let next_day = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        bars.push(bar(next_day, 104.0, 200.0, 103.0, 150.0));

        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default())
            .with_parameters(fast_overrides());
        let metrics = runner.run(&mut TyrionStrategy::new(), &bars).unwrap();

        assert_eq!(metrics.orders_submitted, 2);
        assert_eq!(metrics.total_trades, 0);
    }

    #[test]
    fn test_backtest_synthetic_scenarios() {
        init_logging();
        let runner = BacktestRunner::new(100_000.0, ExecutionCosts::default());

        for scenario in MarketScenario::ALL {
            let bars = synthetic(scenario, 120);
            let mut strategy = TyrionStrategy::new();
            let metrics = runner.run(&mut strategy, &bars).unwrap();

            println!("{:?}: {:?} trades", scenario, metrics.total_trades);
            assert_eq!(
                metrics.total_trades,
                metrics.winning_trades + metrics.losing_trades
            );
            // Every round trip is closed the same day it opened
            for trade in &metrics.trades {
                assert_eq!(trade.entry_time.date_naive(), trade.exit_time.date_naive());
                assert_eq!(trade.side, crate::models::OrderSide::Buy);
                assert_eq!(trade.quantity, 1);
            }
        }
    }

    #[test]
    fn test_backtest_insufficient_data() {
        let bars = synthetic(MarketScenario::Uptrend, 2);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default());

        let result = runner.run(&mut TyrionStrategy::new(), &bars);
        assert!(matches!(
            result,
            Err(BacktestError::InsufficientBars { needed: 80, .. })
        ));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Not enough bars"));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let bars = synthetic(MarketScenario::Uptrend, 30);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default())
            .with_parameters(HashMap::from([("Bogus".to_string(), 1.0)]));

        let result = runner.run(&mut TyrionStrategy::new(), &bars);
        assert!(matches!(
            result,
            Err(BacktestError::Parameter(ParameterError::Unknown(_)))
        ));
    }

    #[test]
    fn test_unordered_bars_rejected() {
        let mut bars = synthetic(MarketScenario::Uptrend, 30);
        bars.swap(10, 11);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default());

        let result = runner.run(&mut TyrionStrategy::new(), &bars);
        assert!(matches!(result, Err(BacktestError::Unordered { .. })));
    }

    /// Buys every bar it is flat, never closes on its own
    struct AlwaysLong;

    impl Strategy for AlwaysLong {
        fn declare_parameters(&self) -> ParameterList {
            ParameterList::new()
        }

        fn initialize(
            &mut self,
            _params: &ResolvedParameters,
            _indicators: &mut IndicatorRegistry,
        ) -> Result<(), ParameterError> {
            Ok(())
        }

        fn on_new_bar(&self, _ctx: &BarContext<'_>) -> Vec<OrderIntent> {
            vec![OrderIntent::MarketEntry {
                side: crate::models::OrderSide::Buy,
                quantity: 1,
                label: "buy".to_string(),
            }]
        }

        fn name(&self) -> &str {
            "AlwaysLong"
        }
    }

    #[test]
    fn test_max_position_and_end_of_data() {
        let bars = crossing_session(4, 120.0);
        let runner = BacktestRunner::new(10_000.0, ExecutionCosts::default());

        let metrics = runner.run(&mut AlwaysLong, &bars).unwrap();

        // Without advanced management one order works at a time; extras are rejected at fill time
        assert!(metrics.orders_rejected > 0);
        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.trades[0].exit_reason, ExitReason::EndOfData);
    }
}
