use crate::models::{ExitReason, OrderSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single round trip for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Side of the opening fill
    pub side: OrderSide,
    pub quantity: u32,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_points: f64,
    pub pnl: f64, // pnl_points * quantity * point value
    pub pnl_pct: f64,
    pub holding_period_minutes: i64,
    pub commission: f64, // Entry + exit
    pub net_pnl: f64,    // P&L after commission
    pub exit_reason: ExitReason,
}

impl TradeRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        side: OrderSide,
        quantity: u32,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        point_value: f64,
        commission: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let direction = match side {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        };
        let pnl_points = (exit_price - entry_price) * direction;
        let pnl = pnl_points * quantity as f64 * point_value;
        let pnl_pct = if entry_price != 0.0 {
            (pnl_points / entry_price) * 100.0
        } else {
            0.0
        };

        Self {
            side,
            quantity,
            entry_time,
            exit_time,
            entry_price,
            exit_price,
            pnl_points,
            pnl,
            pnl_pct,
            holding_period_minutes: (exit_time - entry_time).num_minutes(),
            commission,
            net_pnl: pnl - commission,
            exit_reason,
        }
    }
}

/// Complete backtest performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // P&L Metrics
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub initial_portfolio_value: f64,
    pub final_portfolio_value: f64,

    // Trade Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub take_profit_exits: usize,
    pub session_close_exits: usize,

    // P&L Distribution
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Total wins / total losses, `None` when there are wins but no losses
    pub profit_factor: Option<f64>,

    // Risk Metrics
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,

    // Holding Period
    pub avg_holding_period_minutes: f64,
    pub max_holding_period_minutes: i64,
    pub min_holding_period_minutes: i64,

    // Costs
    pub total_commissions: f64,
    pub net_pnl: f64, // total_pnl - total_commissions
    pub net_return_pct: f64,

    // Orders
    pub orders_submitted: usize,
    pub orders_rejected: usize,

    // Trade Records
    pub trades: Vec<TradeRecord>,
}

impl BacktestMetrics {
    /// Calculate metrics from completed round trips
    ///
    /// The final portfolio value is the initial capital plus net P&L.
    pub fn from_trades(
        trades: Vec<TradeRecord>,
        initial_portfolio_value: f64,
        orders_submitted: usize,
        orders_rejected: usize,
    ) -> Self {
        let total_trades = trades.len();

        if total_trades == 0 {
            return Self::empty(initial_portfolio_value, orders_submitted, orders_rejected);
        }

        // P&L calculations
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let total_commissions: f64 = trades.iter().map(|t| t.commission).sum();
        let net_pnl = total_pnl - total_commissions;
        let final_portfolio_value = initial_portfolio_value + net_pnl;
        let total_return_pct = (total_pnl / initial_portfolio_value) * 100.0;
        let net_return_pct = (net_pnl / initial_portfolio_value) * 100.0;

        // Win/Loss statistics
        let winning_trades: Vec<&TradeRecord> = trades.iter().filter(|t| t.pnl > 0.0).collect();
        let losing_trades: Vec<&TradeRecord> = trades.iter().filter(|t| t.pnl <= 0.0).collect();

        let winning_count = winning_trades.len();
        let losing_count = losing_trades.len();
        let win_rate = (winning_count as f64 / total_trades as f64) * 100.0;

        let take_profit_exits = trades
            .iter()
            .filter(|t| t.exit_reason == ExitReason::TakeProfit)
            .count();
        let session_close_exits = trades
            .iter()
            .filter(|t| t.exit_reason == ExitReason::SessionClose)
            .count();

        // Average wins/losses
        let total_wins: f64 = winning_trades.iter().map(|t| t.pnl).sum();
        let total_losses: f64 = losing_trades.iter().map(|t| t.pnl.abs()).sum();

        let avg_win = if winning_count > 0 {
            total_wins / winning_count as f64
        } else {
            0.0
        };

        let avg_loss = if losing_count > 0 {
            total_losses / losing_count as f64
        } else {
            0.0
        };

        // Largest win/loss
        let largest_win = winning_trades
            .iter()
            .map(|t| t.pnl)
            .fold(0.0, f64::max);

        let largest_loss = losing_trades
            .iter()
            .map(|t| t.pnl)
            .fold(0.0, f64::min);

        // Profit factor
        let profit_factor = if total_losses > 0.0 {
            Some(total_wins / total_losses)
        } else if total_wins > 0.0 {
            None
        } else {
            Some(0.0)
        };

        let (max_drawdown, max_drawdown_pct) =
            Self::calculate_drawdown(&trades, initial_portfolio_value);

        // Sharpe ratio (simplified - using trade returns)
        let sharpe_ratio = Self::calculate_sharpe_ratio(&trades);

        // Holding periods
        let holding_periods: Vec<i64> = trades.iter().map(|t| t.holding_period_minutes).collect();
        let avg_holding_period_minutes =
            holding_periods.iter().sum::<i64>() as f64 / holding_periods.len() as f64;
        let max_holding_period_minutes = *holding_periods.iter().max().unwrap_or(&0);
        let min_holding_period_minutes = *holding_periods.iter().min().unwrap_or(&0);

        Self {
            total_pnl,
            total_return_pct,
            initial_portfolio_value,
            final_portfolio_value,
            total_trades,
            winning_trades: winning_count,
            losing_trades: losing_count,
            win_rate,
            take_profit_exits,
            session_close_exits,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            profit_factor,
            max_drawdown,
            max_drawdown_pct,
            sharpe_ratio,
            avg_holding_period_minutes,
            max_holding_period_minutes,
            min_holding_period_minutes,
            total_commissions,
            net_pnl,
            net_return_pct,
            orders_submitted,
            orders_rejected,
            trades,
        }
    }

    /// Empty metrics for when no trades occurred
    fn empty(
        initial_portfolio_value: f64,
        orders_submitted: usize,
        orders_rejected: usize,
    ) -> Self {
        Self {
            total_pnl: 0.0,
            total_return_pct: 0.0,
            initial_portfolio_value,
            final_portfolio_value: initial_portfolio_value,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            take_profit_exits: 0,
            session_close_exits: 0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: Some(0.0),
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            avg_holding_period_minutes: 0.0,
            max_holding_period_minutes: 0,
            min_holding_period_minutes: 0,
            total_commissions: 0.0,
            net_pnl: 0.0,
            net_return_pct: 0.0,
            orders_submitted,
            orders_rejected,
            trades: vec![],
        }
    }

    /// Calculate maximum drawdown of the net equity curve
    fn calculate_drawdown(trades: &[TradeRecord], initial_value: f64) -> (f64, f64) {
        let mut peak = initial_value;
        let mut max_dd = 0.0;
        let mut max_dd_pct = 0.0;
        let mut current_value = initial_value;

        for trade in trades {
            current_value += trade.net_pnl;

            if current_value > peak {
                peak = current_value;
            }

            let drawdown = peak - current_value;
            if drawdown > max_dd {
                max_dd = drawdown;
                max_dd_pct = if peak > 0.0 {
                    (drawdown / peak) * 100.0
                } else {
                    0.0
                };
            }
        }

        (max_dd, max_dd_pct)
    }

    /// Calculate Sharpe ratio (simplified)
    /// Assumes risk-free rate of 0 for simplicity
    fn calculate_sharpe_ratio(trades: &[TradeRecord]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }

        let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
        let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;

        let variance = returns
            .iter()
            .map(|r| {
                let diff = r - mean_return;
                diff * diff
            })
            .sum::<f64>()
            / returns.len() as f64;

        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            mean_return / std_dev
        } else {
            0.0
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              BACKTEST PERFORMANCE REPORT              ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 P&L SUMMARY");
        println!("  Initial Capital:       {:.2}", self.initial_portfolio_value);
        println!("  Final Capital:         {:.2}", self.final_portfolio_value);
        println!(
            "  Gross P&L:             {:.2} ({:+.2}%)",
            self.total_pnl, self.total_return_pct
        );
        println!("  Commissions:           {:.2}", self.total_commissions);
        println!(
            "  Net P&L:               {:.2} ({:+.2}%)",
            self.net_pnl, self.net_return_pct
        );

        println!("\n📈 TRADE STATISTICS");
        println!("  Orders Submitted:      {}", self.orders_submitted);
        println!("  Orders Rejected:       {}", self.orders_rejected);
        println!("  Total Trades:          {}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losing Trades:         {}", self.losing_trades);
        println!("  Take Profit Exits:     {}", self.take_profit_exits);
        println!("  Session Close Exits:   {}", self.session_close_exits);

        if self.total_trades > 0 {
            println!("\n💰 WIN/LOSS ANALYSIS");
            println!("  Average Win:           {:.2}", self.avg_win);
            println!("  Average Loss:          {:.2}", self.avg_loss);
            println!("  Largest Win:           {:.2}", self.largest_win);
            println!("  Largest Loss:          {:.2}", self.largest_loss);
            match self.profit_factor {
                Some(pf) => println!("  Profit Factor:         {:.2}", pf),
                None => println!("  Profit Factor:         ∞ (no losses)"),
            }

            println!("\n⚠️  RISK METRICS");
            println!(
                "  Max Drawdown:          {:.2} ({:.2}%)",
                self.max_drawdown, self.max_drawdown_pct
            );
            println!("  Sharpe Ratio:          {:.2}", self.sharpe_ratio);

            println!("\n⏱️  HOLDING PERIODS");
            println!(
                "  Average:               {:.1} minutes ({:.1} hours)",
                self.avg_holding_period_minutes,
                self.avg_holding_period_minutes / 60.0
            );
            println!(
                "  Max:                   {} minutes",
                self.max_holding_period_minutes
            );
            println!(
                "  Min:                   {} minutes",
                self.min_holding_period_minutes
            );
        }

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}
