//! Poller configuration.

use std::time::Duration;

use derive_builder::Builder;

/// Default interval between two polls: 2 seconds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration shared by the run status and inspector pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PollerConfig {
    /// Interval between two polls.
    #[builder(default = "DEFAULT_POLL_INTERVAL")]
    pub interval: Duration,
}

impl PollerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.interval.is_some_and(|interval| interval.is_zero()) {
            return Err("interval must be greater than zero".into());
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollerConfig {
    /// Returns a builder for the configuration.
    pub fn builder() -> PollerConfigBuilder {
        PollerConfigBuilder::default()
    }
}
