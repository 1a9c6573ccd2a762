use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use flowdesk_core::FlowService;
use flowdesk_core::id::{NodeId, WorkflowId};
use flowdesk_core::provider::UploadDocument;
use flowdesk_editor::{
    DocumentSet, GraphState, GraphStore, PollerConfig, RunSnapshot, RunStatusPoller,
};

use crate::TRACING_TARGET_COMMAND;
use crate::shutdown::shutdown_signal;

/// Arguments of the `run` command.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Workflow to run
    pub workflow: WorkflowId,

    /// Files to upload
    #[arg(long = "file", short = 'f', required = true)]
    pub files: Vec<PathBuf>,

    /// Trigger node receiving the files; required when the workflow has
    /// several trigger nodes
    #[arg(long = "trigger")]
    pub trigger: Option<NodeId>,
}

pub async fn execute(
    service: FlowService,
    args: RunArgs,
    config: PollerConfig,
) -> anyhow::Result<()> {
    let store = GraphStore::new(service.clone());
    store
        .load(args.workflow)
        .await
        .with_context(|| format!("failed to load workflow {}", args.workflow))?;

    let mut documents = Vec::with_capacity(args.files.len());
    for path in &args.files {
        documents.push(read_document(path).await?);
    }

    let state = store.snapshot();
    let set = DocumentSet::route(&state, args.trigger, documents)?;

    let mut poller = RunStatusPoller::new(service, config);
    let run = poller.trigger(args.workflow, vec![set]).await?;
    println!("run {} started", run.id);

    let mut updates = poller.subscribe();
    let finished = async {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            print!("{}", render(&state, &snapshot));
            if snapshot.phase.is_terminal() || updates.changed().await.is_err() {
                return snapshot;
            }
        }
    };

    tokio::select! {
        snapshot = finished => {
            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                run_id = %run.id,
                phase = %snapshot.phase,
                "Run finished"
            );
        }
        () = shutdown_signal() => poller.stop(),
    }

    Ok(())
}

async fn read_document(path: &Path) -> anyhow::Result<UploadDocument> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;

    Ok(UploadDocument::new(file_name, content))
}

fn render(state: &GraphState, snapshot: &RunSnapshot) -> String {
    let mut out = format!("[{}]\n", snapshot.phase);

    for node in &state.nodes {
        let Some(status) = snapshot.overlay.dominant_status(node.id) else {
            continue;
        };

        let ports = snapshot.overlay.active_output_ports(node.id);
        if ports.is_empty() {
            out.push_str(&format!("  {}: {status}\n", node.name));
        } else {
            let ports = ports.into_iter().collect::<Vec<_>>().join(", ");
            out.push_str(&format!("  {}: {status} -> {ports}\n", node.name));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use flowdesk_core::graph::{Node, NodeKind, Position};
    use flowdesk_core::run::{DocumentStatus, NodeStatusCount};
    use flowdesk_editor::{RunOverlay, RunPhase};

    use super::*;

    #[test]
    fn test_render_lists_active_ports() {
        let check = Node::new(NodeId::new(), NodeKind::ConditionalIf, "Check", Position::default());
        let idle = Node::new(NodeId::new(), NodeKind::Extractor, "Extract", Position::default());
        let state = GraphState {
            workflow: None,
            nodes: vec![check.clone(), idle],
            edges: Vec::new(),
        };
        let snapshot = RunSnapshot {
            phase: RunPhase::Completed,
            run: None,
            overlay: RunOverlay::from_samples([
                NodeStatusCount::new(check.id, DocumentStatus::Completed, 1).with_output_port("true"),
                NodeStatusCount::new(check.id, DocumentStatus::Completed, 1).with_output_port("false"),
            ]),
        };

        assert_eq!(render(&state, &snapshot), "[completed]\n  Check: completed -> false, true\n");
    }
}
