use chrono::NaiveDate;
use std::collections::HashMap;
use tyrion::backtest::{BacktestRunner, ExecutionCosts};
use tyrion::config::{BacktestWindow, Settings};
use tyrion::market_data::{
    BarSource, HistoryRequest, JsonFileSource, MarketScenario, SyntheticSource,
};
use tyrion::strategy::orders::{plan, ENTRY_LABEL, TAKE_PROFIT_LABEL};
use tyrion::strategy::signals::evaluate;
use tyrion::strategy::tyrion::{
    BUY_TRIGGER_LEVEL, STD_DEV_DEVIATIONS, STD_DEV_PERIOD, STOCHASTIC_PERIOD,
};
use tyrion::strategy::{ParameterValue, Strategy, StrategyConfig, TyrionStrategy};
use tyrion::*;

fn fdax_request() -> HistoryRequest {
    let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let window = BacktestWindow::ending_yesterday(today, 6).unwrap();
    HistoryRequest {
        symbol: "FDAX".to_string(),
        bar_period_minutes: 60,
        start: window.start,
        end: window.end,
    }
}

fn fdax_costs() -> ExecutionCosts {
    ExecutionCosts {
        point_value: 25.0,
        commission_per_contract: 0.0,
    }
}

#[test]
fn test_e2e_backtest_workflow() {
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Starting E2E Backtest ===\n");

    // 1. Settings and window
    println!("1. Loading settings...");
    let settings = Settings::load(None).unwrap();
    assert_eq!(settings.symbol, "FDAX");
    let request = fdax_request();
    println!(
        "   ✓ {} {}m from {} to {}",
        request.symbol, request.bar_period_minutes, request.start, request.end
    );

    // 2. Bars
    println!("\n2. Generating bars...");
    let bars = SyntheticSource::new(42, MarketScenario::Volatile)
        .load_bars(&request)
        .unwrap();
    println!("   ✓ {} bars", bars.len());
    assert!(bars.len() > 1_000);

    // 3. Backtest
    println!("\n3. Running backtest...");
    let runner = BacktestRunner::new(settings.initial_capital, fdax_costs());
    let mut strategy = TyrionStrategy::new();
    let metrics = runner.run(&mut strategy, &bars).unwrap();
    println!("   ✓ {} trades, net P&L {:.2}", metrics.total_trades, metrics.net_pnl);

    // 4. Host policies hold for every trade
    println!("\n4. Checking trades...");
    assert!(metrics.total_trades > 0, "volatile data should trigger entries");
    for trade in &metrics.trades {
        assert_eq!(trade.side, OrderSide::Buy);
        assert_eq!(trade.quantity, 1);
        assert_eq!(trade.entry_time.date_naive(), trade.exit_time.date_naive());
        if trade.exit_reason == ExitReason::TakeProfit {
            assert!(trade.pnl > 0.0);
        }
    }
    // Trades never overlap, so the position never exceeds one contract
    for pair in metrics.trades.windows(2) {
        assert!(pair[0].exit_time <= pair[1].entry_time);
    }
    assert_eq!(
        metrics.take_profit_exits + metrics.session_close_exits,
        metrics.total_trades
    );
    // Orders always come in entry + take-profit pairs
    assert_eq!(metrics.orders_submitted % 2, 0);
    println!("   ✓ all trades long, single contract, closed intraday");
}

#[test]
fn test_json_file_source_matches_synthetic() {
    let request = fdax_request();
    let synthetic = SyntheticSource::new(7, MarketScenario::Sideways);
    let bars = synthetic.load_bars(&request).unwrap();

    let path = std::env::temp_dir().join(format!("tyrion-e2e-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&bars).unwrap()).unwrap();
    let loaded = JsonFileSource::new(&path).load_bars(&request);
    std::fs::remove_file(&path).ok();
    let loaded = loaded.unwrap();

    assert_eq!(loaded.len(), bars.len());

    let runner = BacktestRunner::new(10_000.0, fdax_costs());
    let from_memory = runner.run(&mut TyrionStrategy::new(), &bars).unwrap();
    let from_file = runner.run(&mut TyrionStrategy::new(), &loaded).unwrap();

    assert_eq!(from_memory.total_trades, from_file.total_trades);
    assert_eq!(from_memory.net_pnl, from_file.net_pnl);
}

#[test]
fn test_unreachable_trigger_never_trades() {
    let bars = SyntheticSource::new(42, MarketScenario::Volatile)
        .load_bars(&fdax_request())
        .unwrap();

    // %D is bounded by 100, so it can never cross above it
    let runner = BacktestRunner::new(10_000.0, fdax_costs())
        .with_parameters(HashMap::from([(BUY_TRIGGER_LEVEL.to_string(), 100.0)]));
    let metrics = runner.run(&mut TyrionStrategy::new(), &bars).unwrap();

    assert_eq!(metrics.orders_submitted, 0);
    assert_eq!(metrics.total_trades, 0);
    assert_eq!(metrics.final_portfolio_value, 10_000.0);
}

#[test]
fn test_fractional_period_override_rejected() {
    let bars = SyntheticSource::new(42, MarketScenario::Sideways)
        .load_bars(&fdax_request())
        .unwrap();

    let runner = BacktestRunner::new(10_000.0, fdax_costs())
        .with_parameters(HashMap::from([(STOCHASTIC_PERIOD.to_string(), 14.5)]));
    let result = runner.run(&mut TyrionStrategy::new(), &bars);

    assert!(matches!(
        result,
        Err(BacktestError::Parameter(ParameterError::NotAnInteger { .. }))
    ));
}

#[test]
fn test_declared_parameters_round_trip() {
    let mut strategy = TyrionStrategy::new();
    let declared = strategy.declare_parameters();

    let expected = [
        (STD_DEV_PERIOD, ParameterValue::Integer(20)),
        (STD_DEV_DEVIATIONS, ParameterValue::Decimal(3.0)),
        (STOCHASTIC_PERIOD, ParameterValue::Integer(77)),
        (BUY_TRIGGER_LEVEL, ParameterValue::Decimal(51.0)),
    ];
    assert_eq!(declared.len(), expected.len());
    for (name, value) in expected {
        assert_eq!(declared.get(name).unwrap().default, value);
    }

    let mut registry = tyrion::strategy::IndicatorRegistry::new();
    strategy.initialize(&declared.defaults(), &mut registry).unwrap();
    assert_eq!(strategy.config(), &StrategyConfig::default());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_signal_and_plan_scenarios() {
    // A: upward cross while flat
    let signal = evaluate(0, 49.0, 55.0, 51.0).unwrap();
    let (entry, take_profit) = plan(&signal, 100.0, 3.0);
    assert!(matches!(
        &entry,
        OrderIntent::MarketEntry { side: OrderSide::Buy, quantity: 1, label }
            if label == ENTRY_LABEL
    ));
    assert!(matches!(
        &take_profit,
        OrderIntent::LimitExit { side: OrderSide::Sell, quantity: 1, price, label }
            if *price == 103.0 && label == TAKE_PROFIT_LABEL
    ));

    // B: previous value on the level still counts as below it
    assert!(evaluate(0, 51.0, 52.0, 51.0).is_some());
    // C: already above the level
    assert!(evaluate(0, 60.0, 70.0, 51.0).is_none());
    // D: position open
    assert!(evaluate(1, 49.0, 55.0, 51.0).is_none());
}
