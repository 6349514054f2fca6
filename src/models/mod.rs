use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OHLCV price bar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Signed contract delta for a fill of `quantity` on this side
    pub fn signed(self, quantity: u32) -> i64 {
        match self {
            OrderSide::Buy => quantity as i64,
            OrderSide::Sell => -(quantity as i64),
        }
    }
}

/// Order a strategy asks the host to submit
///
/// Immutable once created. The host owns everything that happens after
/// submission (fills, cancels, contingency).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderIntent {
    MarketEntry {
        side: OrderSide,
        quantity: u32,
        label: String,
    },
    LimitExit {
        side: OrderSide,
        quantity: u32,
        price: f64,
        label: String,
    },
}

impl OrderIntent {
    pub fn side(&self) -> OrderSide {
        match self {
            OrderIntent::MarketEntry { side, .. } | OrderIntent::LimitExit { side, .. } => *side,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            OrderIntent::MarketEntry { quantity, .. }
            | OrderIntent::LimitExit { quantity, .. } => *quantity,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderIntent::MarketEntry { label, .. } | OrderIntent::LimitExit { label, .. } => label,
        }
    }

    /// Limit price, `None` for market orders
    pub fn limit_price(&self) -> Option<f64> {
        match self {
            OrderIntent::MarketEntry { .. } => None,
            OrderIntent::LimitExit { price, .. } => Some(*price),
        }
    }

    pub fn is_market(&self) -> bool {
        matches!(self, OrderIntent::MarketEntry { .. })
    }
}

/// Host-reported execution of a working order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub is_market: bool,
}

/// Why a round trip was closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    MarketOrder,
    SessionClose,
    EndOfData,
}
