pub mod metrics;
pub mod order_book;
pub mod position;
pub mod runner;
pub mod session;

pub use metrics::{BacktestMetrics, TradeRecord};
pub use order_book::{BarExecution, OrderBook, WorkingOrder};
pub use position::{ExecutionCosts, PositionTracker};
pub use runner::BacktestRunner;
pub use session::SessionCalendar;
