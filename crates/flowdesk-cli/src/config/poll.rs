//! Poll interval arguments.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use flowdesk_editor::PollerConfig;

/// Poller options shared by the `run` and `inspect` commands.
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    /// Seconds between two polls
    #[arg(long = "poll-interval", env = "FLOWDESK_POLL_INTERVAL", default_value = "2")]
    pub poll_interval: u64,
}

impl PollArgs {
    /// Builds the poller configuration.
    pub fn poller_config(&self) -> anyhow::Result<PollerConfig> {
        PollerConfig::builder()
            .interval(Duration::from_secs(self.poll_interval))
            .build()
            .context("invalid poll interval")
    }
}
