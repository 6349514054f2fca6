use chrono::Utc;
use std::collections::HashMap;
use tyrion::backtest::{BacktestRunner, ExecutionCosts};
use tyrion::config::BacktestWindow;
use tyrion::market_data::{BarSource, HistoryRequest, MarketScenario, SyntheticSource};
use tyrion::strategy::tyrion::BUY_TRIGGER_LEVEL;
use tyrion::strategy::TyrionStrategy;
use tyrion::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("tyrion=warn")
        .init();

    println!("\n╔══════════════════════════════════════════════════════╗");
    println!("║     STOCHASTIC %D TRIGGER LEVEL SWEEP                ║");
    println!("╚══════════════════════════════════════════════════════╝\n");

    let window = BacktestWindow::ending_yesterday(Utc::now().date_naive(), 6)
        .ok_or("backtest window is out of range")?;
    let request = HistoryRequest {
        symbol: "FDAX".to_string(),
        bar_period_minutes: 60,
        start: window.start,
        end: window.end,
    };
    let costs = ExecutionCosts {
        point_value: 25.0,
        commission_per_contract: 0.0,
    };

    let trigger_levels = [20.0, 30.0, 40.0, 51.0, 60.0, 70.0, 80.0];

    for scenario in MarketScenario::ALL {
        let bars = SyntheticSource::new(42, scenario).load_bars(&request)?;

        println!("\n═══════════════════════════════════════════════════════");
        println!("{:?}: {} bars", scenario, bars.len());
        println!("═══════════════════════════════════════════════════════\n");

        println!("Trigger | Net P&L    | Trades | Win Rate | TP Exits");
        println!("--------|------------|--------|----------|---------");

        let mut best_pnl = f64::NEG_INFINITY;
        let mut best_level = 0.0;

        for &level in &trigger_levels {
            let runner = BacktestRunner::new(10_000.0, costs)
                .with_parameters(HashMap::from([(BUY_TRIGGER_LEVEL.to_string(), level)]));
            let mut strategy = TyrionStrategy::new();

            match runner.run(&mut strategy, &bars) {
                Ok(metrics) => {
                    println!(
                        "{:^7.1} | {:>10.2} | {:>6} | {:>7.1}% | {:>8}",
                        level,
                        metrics.net_pnl,
                        metrics.total_trades,
                        metrics.win_rate,
                        metrics.take_profit_exits
                    );

                    if metrics.net_pnl > best_pnl {
                        best_pnl = metrics.net_pnl;
                        best_level = level;
                    }
                }
                Err(e) => {
                    println!("{:^7.1} | ERROR: {}", level, e);
                }
            }
        }

        println!(
            "\n🏆 Best trigger for {:?}: %D > {:.1} ({:+.2})",
            scenario, best_level, best_pnl
        );
    }

    println!("\n═══════════════════════════════════════════════════════\n");

    Ok(())
}
