use super::moving_average::calculate_sma;
use crate::models::Bar;

/// Number of %K values averaged into %D
pub const D_SMOOTHING_PERIOD: usize = 3;

/// Calculate the fast Stochastic %K of the latest bar
///
/// %K = 100 * (close - lowest low) / (highest high - lowest low) over the
/// last `period` bars. A flat range has no defined position, so it reports
/// the midpoint (50).
///
/// Values:
/// - %K near 100: close at the top of the recent range
/// - %K near 0: close at the bottom of the recent range
pub fn calculate_stochastic_k(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let window = &bars[bars.len() - period..];
    let highest_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let lowest_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let close = window.last()?.close;

    let range = highest_high - lowest_low;
    if range <= 0.0 {
        return Some(50.0);
    }

    Some(100.0 * (close - lowest_low) / range)
}

/// Calculate Stochastic %D (signal line) of the latest bar
///
/// %D is the simple average of the last three %K values, so it needs
/// `period + 2` bars of history.
pub fn calculate_stochastic_d(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + D_SMOOTHING_PERIOD - 1 {
        return None;
    }

    let k_values = (0..D_SMOOTHING_PERIOD)
        .rev()
        .map(|ago| calculate_stochastic_k(&bars[..bars.len() - ago], period))
        .collect::<Option<Vec<f64>>>()?;

    calculate_sma(&k_values, D_SMOOTHING_PERIOD)
}
