#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod shutdown;

use std::process;

use anyhow::Context;
use flowdesk_reqwest::ReqwestClient;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_COMMAND: &str = "flowdesk_cli::command";
pub const TRACING_TARGET_SHUTDOWN: &str = "flowdesk_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "flowdesk_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    let retryable = is_retryable(&error);
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %error,
            retryable,
            "command failed"
        );
    } else if retryable {
        eprintln!("Error: {error:#} (transient, try again)");
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(exit_code(&error));
}

/// Exit status for failures that are worth retrying (`EX_TEMPFAIL`).
const EXIT_TEMPFAIL: i32 = 75;

/// Returns whether any error in the chain is a retryable API error.
fn is_retryable(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<flowdesk_core::Error>())
        .any(flowdesk_core::Error::is_retryable)
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if is_retryable(error) { EXIT_TEMPFAIL } else { 1 }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();
    cli.log();

    let client = ReqwestClient::new(cli.client.clone()).context("invalid API client configuration")?;
    cli.command.execute(client.into_service(), &cli.poll).await
}

#[cfg(test)]
mod tests {
    use flowdesk_core::{Error, ErrorKind};

    use super::*;

    #[test]
    fn test_transient_failures_exit_with_tempfail() {
        let error = anyhow::Error::new(Error::new(ErrorKind::ServiceUnavailable))
            .context("failed to load workflow");
        assert!(is_retryable(&error));
        assert_eq!(exit_code(&error), EXIT_TEMPFAIL);
    }

    #[test]
    fn test_other_failures_exit_with_one() {
        let error = anyhow::Error::new(Error::not_found().with_message("workflow"));
        assert!(!is_retryable(&error));
        assert_eq!(exit_code(&error), 1);

        let error = anyhow::anyhow!("no trigger node");
        assert_eq!(exit_code(&error), 1);
    }
}
