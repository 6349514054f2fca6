use crate::error::BacktestError;
use crate::models::Bar;
use chrono::Duration;

/// Splits a bar series into trading sessions
///
/// A session ends where the next bar starts at least `min_break` later than
/// a regular bar step would put it, or at the last bar of the data. Sessions
/// are found from the data itself, so exchange hours that straddle UTC
/// midnight (FDAX opens 23:00 UTC in summer) still end at the overnight gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCalendar {
    bar_interval: Duration,
    min_break: Duration,
}

impl SessionCalendar {
    /// Shortest gap beyond one bar step that counts as a session break
    pub const DEFAULT_BREAK_MINUTES: u32 = 120;

    /// # Arguments
    /// * `bar_period_minutes` - Regular spacing between bar timestamps
    /// * `break_minutes` - Extra gap that separates two sessions; a missing
    ///   bar or two inside a session stays below it
    pub fn new(bar_period_minutes: u32, break_minutes: u32) -> Self {
        Self {
            bar_interval: Duration::minutes(bar_period_minutes.max(1) as i64),
            min_break: Duration::minutes(break_minutes.max(1) as i64),
        }
    }

    /// Whether `bars[index]` is the last bar of its trading session
    pub fn is_session_end(&self, bars: &[Bar], index: usize) -> bool {
        match (bars.get(index), bars.get(index + 1)) {
            (Some(current), Some(next)) => {
                next.timestamp - current.timestamp - self.bar_interval >= self.min_break
            }
            _ => true,
        }
    }

    /// Number of distinct sessions in `bars`
    pub fn session_count(&self, bars: &[Bar]) -> usize {
        (0..bars.len())
            .filter(|&i| self.is_session_end(bars, i))
            .count()
    }
}

impl Default for SessionCalendar {
    fn default() -> Self {
        Self::new(60, Self::DEFAULT_BREAK_MINUTES)
    }
}

/// Bars must be strictly increasing in time
pub fn validate_chronological(bars: &[Bar]) -> Result<(), BacktestError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(BacktestError::Unordered { index: i + 1 });
        }
    }
    Ok(())
}
