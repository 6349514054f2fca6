use super::metrics::TradeRecord;
use crate::models::{ExitReason, Fill, OrderSide};
use chrono::{DateTime, Utc};

/// Contract value and commissions applied by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionCosts {
    /// Currency value of one price point per contract
    pub point_value: f64,
    /// Charged per contract on every fill
    pub commission_per_contract: f64,
}

impl Default for ExecutionCosts {
    fn default() -> Self {
        Self {
            point_value: 1.0,
            commission_per_contract: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenLot {
    side: OrderSide,
    entry_price: f64,
    entry_time: DateTime<Utc>,
}

/// Host-owned position state
///
/// Tracks the signed open quantity and turns every closed lot into a
/// `TradeRecord`.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    position: i64,
    open: Option<OpenLot>,
    costs: ExecutionCosts,
    trades: Vec<TradeRecord>,
}

impl PositionTracker {
    pub fn new(costs: ExecutionCosts) -> Self {
        Self {
            position: 0,
            open: None,
            costs,
            trades: Vec::new(),
        }
    }

    /// Signed open quantity, positive when long
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0
    }

    /// Completed round trips so far
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    /// Apply an execution, closing and/or opening lots as needed
    pub fn apply_fill(&mut self, fill: &Fill) {
        let reason = if fill.is_market {
            ExitReason::MarketOrder
        } else {
            ExitReason::TakeProfit
        };
        self.apply(
            fill.side,
            fill.quantity,
            fill.price,
            fill.timestamp,
            reason,
        );
    }

    /// Close whatever is open at `price`
    pub fn flatten(&mut self, price: f64, timestamp: DateTime<Utc>, reason: ExitReason) {
        if self.position == 0 {
            return;
        }

        let side = if self.position > 0 {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };
        let quantity = self.position.unsigned_abs() as u32;

        tracing::debug!(
            "Flattening {} contract(s) @ {:.2} ({:?})",
            quantity,
            price,
            reason
        );
        self.apply(side, quantity, price, timestamp, reason);
    }

    fn apply(
        &mut self,
        side: OrderSide,
        quantity: u32,
        price: f64,
        timestamp: DateTime<Utc>,
        reason: ExitReason,
    ) {
        let delta = side.signed(quantity);
        let before = self.position;
        let after = before + delta;

        let reduces = before != 0 && before.signum() != delta.signum();
        if reduces {
            let closed = delta.abs().min(before.abs()) as u32;
            if let Some(lot) = &self.open {
                let commission = self.costs.commission_per_contract * closed as f64 * 2.0;
                let trade = TradeRecord::new(
                    lot.side,
                    closed,
                    lot.entry_time,
                    lot.entry_price,
                    timestamp,
                    price,
                    self.costs.point_value,
                    commission,
                    reason,
                );
                tracing::debug!(
                    "Closed {:?} {} @ {:.2} -> {:.2}, P&L {:.2}",
                    lot.side,
                    closed,
                    lot.entry_price,
                    price,
                    trade.pnl
                );
                self.trades.push(trade);
            }
        }

        self.position = after;

        if after == 0 {
            self.open = None;
        } else if before == 0 || before.signum() != after.signum() {
            // New lot, or the fill flipped through flat
            self.open = Some(OpenLot {
                side,
                entry_price: price,
                entry_time: timestamp,
            });
        } else if !reduces {
            // Adding to the same side: average the entry
            if let Some(lot) = &mut self.open {
                let held = before.abs() as f64;
                let added = delta.abs() as f64;
                lot.entry_price = (lot.entry_price * held + price * added) / (held + added);
            }
        }
    }
}
