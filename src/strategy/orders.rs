use super::signals::EntrySignal;
use crate::models::{OrderIntent, OrderSide};

pub const ENTRY_LABEL: &str = "Entry long";
pub const TAKE_PROFIT_LABEL: &str = "Exit long (take profit stop)";

/// Contracts traded per signal
pub const ORDER_QUANTITY: u32 = 1;

/// Build the market entry and its take-profit exit for a signal
///
/// The exit is a sell limit one StdDev band above the signal bar's close.
/// Both orders are returned together; the host handles sequencing.
pub fn plan(
    _signal: &EntrySignal,
    current_close: f64,
    current_std_dev: f64,
) -> (OrderIntent, OrderIntent) {
    let entry = OrderIntent::MarketEntry {
        side: OrderSide::Buy,
        quantity: ORDER_QUANTITY,
        label: ENTRY_LABEL.to_string(),
    };

    let take_profit = OrderIntent::LimitExit {
        side: OrderSide::Sell,
        quantity: ORDER_QUANTITY,
        price: current_close + current_std_dev,
        label: TAKE_PROFIT_LABEL.to_string(),
    };

    (entry, take_profit)
}
