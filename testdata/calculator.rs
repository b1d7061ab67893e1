pub fn calculate_sum(a: i64, b: i64) -> i64 {
    a + b
}

/// Keeps a running total.
#[derive(Debug, Default)]
pub struct Calculator {
    total: i64,
}

impl Calculator {
    /// Creates a calculator.
    ///
    /// # Arguments
    ///
    /// * `start` - initial total
    pub fn new(start: i64) -> Self {
        Self { total: start }
    }

    /// Adds a value.
    ///
    /// # Arguments
    ///
    /// * `value` - amount to add
    pub fn add(&mut self, value: i64, times: i64) -> i64 {
        self.total += value * times;
        self.total
    }
}
