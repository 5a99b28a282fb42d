//! Back-off configuration for the server accept loop.

use std::time::Duration;

/// Exponential back-off applied when `accept()` fails.
///
/// Accept errors such as running out of file descriptors are usually
/// transient, so the loop sleeps and retries instead of stopping the server.
/// The delay starts at `initial_delay`, doubles after each consecutive
/// failure and is capped at `max_delay`.
///
/// Defaults: 10 milliseconds initial, 1 second maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay used for the first retry after an `accept()` failure.
    pub initial_delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Clamp both delays to at least 1 ms and order them so that
    /// `initial_delay <= max_delay`.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use gateway_telemetry::server::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     initial_delay: Duration::ZERO,
    ///     max_delay: Duration::from_millis(20),
    /// }
    /// .normalized();
    /// assert_eq!(cfg.initial_delay, Duration::from_millis(1));
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_delay = self.initial_delay.max(Duration::from_millis(1));
        self.max_delay = self.max_delay.max(Duration::from_millis(1));
        if self.initial_delay > self.max_delay {
            std::mem::swap(&mut self.initial_delay, &mut self.max_delay);
        }
        self
    }

    /// Delay to use after another failure following `current`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration { (current * 2).min(self.max_delay) }
}
