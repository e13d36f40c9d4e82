use std::time::Duration;

use backon::ExponentialBuilder;

/// Retry behaviour for store calls that fail transiently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Total attempts per operation, including the first one.
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200)
        }
    }
}

impl LedgerConfig {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}
