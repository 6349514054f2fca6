/// Long entry produced by an upward %D crossing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignal {
    pub trigger_level: f64,
    pub stochastic_d: f64,
}

/// Decide whether to enter long on this bar
///
/// Fires only while flat, when %D was at or below `buy_trigger_level` on the
/// previous bar and is strictly above it now. Open positions of either sign
/// suppress the signal; there is no short side.
///
/// Callers must not invoke this before two %D values exist.
///
/// # Example
/// ```
/// use tyrion::strategy::signals::evaluate;
///
/// assert!(evaluate(0, 49.0, 55.0, 51.0).is_some());
/// assert!(evaluate(1, 49.0, 55.0, 51.0).is_none());
/// ```
pub fn evaluate(
    position: i64,
    stochastic_d_prev: f64,
    stochastic_d_curr: f64,
    buy_trigger_level: f64,
) -> Option<EntrySignal> {
    if position != 0 {
        return None;
    }

    if stochastic_d_prev <= buy_trigger_level && stochastic_d_curr > buy_trigger_level {
        tracing::debug!(
            "%D crossed {:.2} upwards ({:.2} -> {:.2})",
            buy_trigger_level,
            stochastic_d_prev,
            stochastic_d_curr
        );
        return Some(EntrySignal {
            trigger_level: buy_trigger_level,
            stochastic_d: stochastic_d_curr,
        });
    }

    None
}
