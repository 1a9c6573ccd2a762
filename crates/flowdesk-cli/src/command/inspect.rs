use anyhow::Context;
use clap::Args;
use flowdesk_core::FlowService;
use flowdesk_core::id::{NodeId, WorkflowId};
use flowdesk_core::run::InspectorTab;
use flowdesk_editor::{
    GraphStore, InspectorScope, InspectorSnapshot, NodeInspector, NodeSummaryPoller, PollerConfig,
};

use crate::shutdown::shutdown_signal;

/// Arguments of the `inspect` command.
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Workflow to inspect
    pub workflow: WorkflowId,

    /// Node whose documents to list
    #[arg(long = "node", required_unless_present_any = ["orphaned", "summary"])]
    pub node: Option<NodeId>,

    /// Inspector tab of the node
    #[arg(long = "tab", default_value = "processing", requires = "node")]
    pub tab: InspectorTab,

    /// List documents that lost their node
    #[arg(long = "orphaned", conflicts_with_all = ["node", "summary"])]
    pub orphaned: bool,

    /// Print per-node document counts instead of documents
    #[arg(long = "summary", conflicts_with = "node")]
    pub summary: bool,

    /// Keep polling and print every update until interrupted
    #[arg(long = "watch", short = 'w')]
    pub watch: bool,
}

pub async fn execute(
    service: FlowService,
    args: InspectArgs,
    config: PollerConfig,
) -> anyhow::Result<()> {
    if args.summary {
        return summary(service, args, config).await;
    }

    let scope = match args.node {
        Some(node_id) => {
            let store = GraphStore::new(service.clone());
            store.load(args.workflow).await?;
            let state = store.snapshot();
            let node = state
                .node(node_id)
                .with_context(|| format!("node {node_id} not found"))?;
            InspectorScope::for_node(node, args.tab)?
        }
        None => InspectorScope::Orphaned,
    };

    let mut inspector = NodeInspector::new(service, args.workflow, config);
    inspector.open(scope);
    let mut updates = inspector.subscribe();

    let printing = async {
        loop {
            if updates.changed().await.is_err() {
                return;
            }
            let snapshot = updates.borrow_and_update().clone();
            if !snapshot.loaded {
                continue;
            }
            print!("{}", render(&snapshot));
            if !args.watch {
                return;
            }
        }
    };

    tokio::select! {
        () = printing => {}
        () = shutdown_signal() => {}
    }

    inspector.close();
    Ok(())
}

async fn summary(
    service: FlowService,
    args: InspectArgs,
    config: PollerConfig,
) -> anyhow::Result<()> {
    let store = GraphStore::new(service.clone());
    store.load(args.workflow).await?;
    let state = store.snapshot();

    let mut poller = NodeSummaryPoller::new(service, args.workflow, config);
    poller.start();
    let mut updates = poller.subscribe();

    let printing = async {
        loop {
            if updates.changed().await.is_err() {
                return;
            }
            let snapshot = updates.borrow_and_update().clone();
            for node in &state.nodes {
                let Some(s) = snapshot.summaries.get(&node.id) else {
                    continue;
                };
                println!(
                    "{}: processing={} held={} failed={} completed={} unrouted={}",
                    node.name, s.processing, s.held, s.failed, s.completed, s.unrouted
                );
            }
            if !args.watch {
                return;
            }
        }
    };

    tokio::select! {
        () = printing => {}
        () = shutdown_signal() => {}
    }

    poller.stop();
    Ok(())
}

fn render(snapshot: &InspectorSnapshot) -> String {
    if snapshot.documents.is_empty() {
        return "no documents\n".to_owned();
    }

    let mut out = String::new();
    for document in &snapshot.documents {
        out.push_str(&format!("{}  {}  {}", document.id, document.status, document.file_name));
        if let Some(error) = &document.error {
            out.push_str(&format!("  ({error})"));
        }
        out.push('\n');
    }
    out
}
