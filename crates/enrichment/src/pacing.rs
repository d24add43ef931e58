//! Inter-record pacing.

use std::time::Duration;

/// Delay policy applied between records to respect remote rate limits.
///
/// Injected into the loop so suites can run with no real sleeps.
pub trait PacingPolicy: Send + Sync {
    /// Delay to observe after processing the record at `index`.
    fn delay_after(&self, index: usize) -> Duration;
}

/// Constant delay after every record.
pub struct FixedPacing {
    delay: Duration,
}

impl FixedPacing {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl PacingPolicy for FixedPacing {
    fn delay_after(&self, _index: usize) -> Duration {
        self.delay
    }
}

/// No delay between records.
pub struct NoPacing;

impl PacingPolicy for NoPacing {
    fn delay_after(&self, _index: usize) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pacing_is_constant() {
        let pacing = FixedPacing::new(Duration::from_millis(250));
        assert_eq!(pacing.delay_after(0), Duration::from_millis(250));
        assert_eq!(pacing.delay_after(99), Duration::from_millis(250));
    }

    #[test]
    fn test_no_pacing_is_zero() {
        assert_eq!(NoPacing.delay_after(7), Duration::ZERO);
    }
}
