/// Calculate the standard deviation band of the most recent `period` prices
///
/// Population standard deviation of the window, scaled by `deviations`.
/// The result is already the band width, callers add it to a price as is.
pub fn calculate_std_dev(prices: &[f64], period: usize, deviations: f64) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|p| {
            let diff = p - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    Some(variance.sqrt() * deviations)
}
