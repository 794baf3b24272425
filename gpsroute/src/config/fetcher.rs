//! Runtime configuration for directions fetchers.

use std::time::Duration;

use super::defaults::{DEFAULT_DIRECTIONS_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY};

/// Configuration for directions fetchers and the single-flight queue.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gpsroute::config::FetcherConfig;
///
/// let config = FetcherConfig::default();
/// assert_eq!(config.timeout_secs(), 30);
/// assert_eq!(config.min_request_interval(), None);
///
/// let config = FetcherConfig::new()
///     .with_timeout_secs(10)
///     .with_min_request_interval(Duration::from_millis(250))
///     .with_queue_capacity(4);
/// assert_eq!(config.queue_capacity(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherConfig {
    /// HTTP timeout for a single request (in seconds)
    timeout_secs: u64,
    /// Overrides the provider's minimum spacing between requests
    min_request_interval: Option<Duration>,
    /// Pending requests kept by the single-flight queue (0 = unbounded)
    queue_capacity: usize,
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP timeout in seconds. Default: 30 seconds.
    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    /// Force a minimum interval between consecutive requests.
    ///
    /// When unset each provider applies its own default.
    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = Some(interval);
        self
    }

    /// Set how many requests may wait while one is in flight. Default: 1.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn min_request_interval(&self) -> Option<Duration> {
        self.min_request_interval
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DIRECTIONS_TIMEOUT_SECS,
            min_request_interval: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout_secs(), DEFAULT_DIRECTIONS_TIMEOUT_SECS);
        assert_eq!(config.min_request_interval(), None);
        assert_eq!(config.queue_capacity(), 1);
    }

    #[test]
    fn test_builder_pattern() {
        let config = FetcherConfig::new()
            .with_timeout_secs(5)
            .with_min_request_interval(Duration::ZERO)
            .with_queue_capacity(0);

        assert_eq!(config.timeout_secs(), 5);
        assert_eq!(config.min_request_interval(), Some(Duration::ZERO));
        assert_eq!(config.queue_capacity(), 0);
    }

    #[test]
    fn test_config_is_copy() {
        let config1 = FetcherConfig::new().with_timeout_secs(60);
        let config2 = config1;
        assert_eq!(config1, config2);
    }
}
