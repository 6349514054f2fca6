// Technical indicators module
// Pure functions over bar/price history plus the rolling buffers the host keeps

pub mod moving_average;
pub mod series;
pub mod std_dev;
pub mod stochastic;

pub use moving_average::calculate_sma;
pub use series::RollingSeries;
pub use std_dev::calculate_std_dev;
pub use stochastic::{calculate_stochastic_d, calculate_stochastic_k, D_SMOOTHING_PERIOD};
