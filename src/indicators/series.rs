use std::collections::VecDeque;

/// Rolling window of indicator values, newest first when read
///
/// Maintains at most `capacity` values; `ago(0)` is the current bar,
/// `ago(1)` the previous one.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingSeries {
    /// Create an empty series
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of values to keep (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the value for a new bar, dropping the oldest if full
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);

        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Value `bars_ago` bars back from the current bar
    pub fn ago(&self, bars_ago: usize) -> Option<f64> {
        let len = self.values.len();
        if bars_ago >= len {
            return None;
        }
        self.values.get(len - 1 - bars_ago).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
