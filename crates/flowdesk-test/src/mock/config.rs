//! Mock provider configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration for the mock workflow provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockFlowConfig {
    /// Simulated latency applied to every call, in milliseconds.
    #[cfg_attr(feature = "config", arg(long = "mock-latency-ms", default_value_t = 0))]
    #[serde(default)]
    pub latency_ms: u64,
}

impl MockFlowConfig {
    /// Sets the simulated latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_millis() as u64;
        self
    }

    /// Returns the simulated latency, if any.
    pub fn latency(&self) -> Option<Duration> {
        (self.latency_ms > 0).then(|| Duration::from_millis(self.latency_ms))
    }
}
