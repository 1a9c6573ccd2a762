//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── client: ReqwestConfig   # API URL, token, timeout, user agent
//! ├── poll: PollArgs          # Poll interval
//! └── command: Command        # show | run | inspect
//! ```
//!
//! All options can be provided via CLI arguments or environment variables.

mod poll;

use clap::Parser;
use flowdesk_reqwest::ReqwestConfig;
pub use poll::PollArgs;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_CONFIG;
use crate::command::Command;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "flowdesk")]
#[command(about = "Inspect and run flowdesk workflows")]
#[command(version)]
pub struct Cli {
    /// Workflow API client configuration.
    #[clap(flatten)]
    pub client: ReqwestConfig,

    /// Poller configuration.
    #[clap(flatten)]
    pub poll: PollArgs,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs the effective client configuration.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            api_url = %self.client.base_url,
            has_token = self.client.api_token.is_some(),
            http_timeout_secs = self.client.http_timeout,
            poll_interval_secs = self.poll.poll_interval,
            "client configuration"
        );
    }
}
