use crate::models::{Bar, Fill, OrderIntent, OrderSide};
use std::collections::HashSet;
use uuid::Uuid;

/// Order accepted by the host and waiting for a fill
#[derive(Debug, Clone)]
pub struct WorkingOrder {
    pub id: Uuid,
    pub intent: OrderIntent,
    /// Market entry this order is contingent on
    pub parent: Option<Uuid>,
    /// Bar index at whose close the order was submitted
    pub submitted_at: usize,
}

/// Outcome of matching working orders against one bar
#[derive(Debug, Default)]
pub struct BarExecution {
    pub fills: Vec<Fill>,
    pub rejected: usize,
}

/// Working orders of a single instrument
///
/// Market orders fill at the next bar's open. Limit orders submitted in the
/// same batch as a market entry stay inactive until that entry fills and
/// are dropped if it is rejected or cancelled.
#[derive(Debug)]
pub struct OrderBook {
    working: Vec<WorkingOrder>,
    /// Filled entries that still have a working child
    filled: HashSet<Uuid>,
    advanced: bool,
}

impl OrderBook {
    /// # Arguments
    /// * `advanced_order_management` - allow several working orders at once
    pub fn new(advanced_order_management: bool) -> Self {
        Self {
            working: Vec::new(),
            filled: HashSet::new(),
            advanced: advanced_order_management,
        }
    }

    pub fn working(&self) -> &[WorkingOrder] {
        &self.working
    }

    pub fn has_working(&self) -> bool {
        !self.working.is_empty()
    }

    /// Accept orders at the close of bar `bar_index`
    ///
    /// Returns the ids of the accepted orders. Without advanced order
    /// management only one order may be working at a time.
    pub fn submit(&mut self, intents: Vec<OrderIntent>, bar_index: usize) -> Vec<Uuid> {
        let mut accepted = Vec::new();
        let mut parent = None;

        for intent in intents {
            if !self.advanced && self.has_working() {
                tracing::warn!(
                    "Rejected '{}': an order is already working (advanced management off)",
                    intent.label()
                );
                continue;
            }

            let id = Uuid::new_v4();
            let order_parent = if intent.is_market() {
                parent = Some(id);
                None
            } else {
                parent
            };

            tracing::debug!(
                "Accepted {:?} {} '{}' (limit {:?})",
                intent.side(),
                intent.quantity(),
                intent.label(),
                intent.limit_price()
            );

            self.working.push(WorkingOrder {
                id,
                intent,
                parent: order_parent,
                submitted_at: bar_index,
            });
            accepted.push(id);
        }

        accepted
    }

    /// Cancel every working order, returning how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.working.len();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} working order(s)", cancelled);
        }
        self.working.clear();
        self.filled.clear();
        cancelled
    }

    /// Match working orders against `bar`
    ///
    /// Market orders are handled first at the open, then active limit
    /// orders. Any fill that would take the absolute position above
    /// `max_position` is rejected.
    pub fn process_bar(
        &mut self,
        bar: &Bar,
        bar_index: usize,
        position: i64,
        max_position: u32,
    ) -> BarExecution {
        let mut execution = BarExecution::default();
        let mut position = position;
        let mut dropped: HashSet<Uuid> = HashSet::new();

        // Market orders at the open
        let mut remaining = Vec::with_capacity(self.working.len());
        for order in std::mem::take(&mut self.working) {
            if !order.intent.is_market() || order.submitted_at >= bar_index {
                remaining.push(order);
                continue;
            }

            match self.try_fill(&order, bar.open, bar, position, max_position) {
                Some(fill) => {
                    position += fill.side.signed(fill.quantity);
                    self.filled.insert(order.id);
                    execution.fills.push(fill);
                }
                None => {
                    dropped.insert(order.id);
                    execution.rejected += 1;
                }
            }
        }

        // Limit orders whose entry has filled
        for order in remaining {
            if order.parent.is_some_and(|p| dropped.contains(&p)) {
                tracing::debug!("Dropping '{}': entry was rejected", order.intent.label());
                continue;
            }

            let active = order.submitted_at < bar_index
                && order.parent.map_or(true, |p| self.filled.contains(&p));
            let touched = match (order.intent.side(), order.intent.limit_price()) {
                (OrderSide::Sell, Some(price)) if bar.high >= price => Some(bar.open.max(price)),
                (OrderSide::Buy, Some(price)) if bar.low <= price => Some(bar.open.min(price)),
                _ => None,
            };

            match (active, touched) {
                (true, Some(price)) => {
                    match self.try_fill(&order, price, bar, position, max_position) {
                        Some(fill) => {
                            position += fill.side.signed(fill.quantity);
                            execution.fills.push(fill);
                        }
                        None => execution.rejected += 1,
                    }
                }
                _ => self.working.push(order),
            }
        }

        let working = &self.working;
        self.filled
            .retain(|id| working.iter().any(|order| order.parent == Some(*id)));

        execution
    }

    fn try_fill(
        &self,
        order: &WorkingOrder,
        price: f64,
        bar: &Bar,
        position: i64,
        max_position: u32,
    ) -> Option<Fill> {
        let side = order.intent.side();
        let quantity = order.intent.quantity();
        let after = position + side.signed(quantity);

        if after.unsigned_abs() > max_position as u64 {
            tracing::warn!(
                "Rejected '{}': position {} would exceed max open position {}",
                order.intent.label(),
                after,
                max_position
            );
            return None;
        }

        tracing::debug!(
            "Filled {:?} {} '{}' @ {:.2}",
            side,
            quantity,
            order.intent.label(),
            price
        );

        Some(Fill {
            order_id: order.id,
            side,
            quantity,
            price,
            timestamp: bar.timestamp,
            label: order.intent.label().to_string(),
            is_market: order.intent.is_market(),
        })
    }
}
