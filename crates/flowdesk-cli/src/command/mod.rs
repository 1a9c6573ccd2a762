//! Subcommands.

mod inspect;
mod run;
mod show;

use clap::Subcommand;
use flowdesk_core::FlowService;
pub use inspect::InspectArgs;
pub use run::RunArgs;
pub use show::ShowArgs;

use crate::config::PollArgs;

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a workflow's nodes, ports and edges.
    Show(ShowArgs),
    /// Upload documents, trigger a run and follow its progress.
    Run(RunArgs),
    /// Print the documents of a node tab or the orphaned documents.
    Inspect(InspectArgs),
}

impl Command {
    /// Executes the command against the workflow API.
    pub async fn execute(self, service: FlowService, poll: &PollArgs) -> anyhow::Result<()> {
        match self {
            Self::Show(args) => show::execute(service, args).await,
            Self::Run(args) => run::execute(service, args, poll.poller_config()?).await,
            Self::Inspect(args) => inspect::execute(service, args, poll.poller_config()?).await,
        }
    }
}
