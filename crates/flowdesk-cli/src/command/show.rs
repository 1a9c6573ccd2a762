use anyhow::Context;
use clap::Args;
use flowdesk_core::FlowService;
use flowdesk_core::graph::Port;
use flowdesk_core::id::WorkflowId;
use flowdesk_editor::{GraphState, GraphStore};

/// Arguments of the `show` command.
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Workflow to print
    pub workflow: WorkflowId,
}

pub async fn execute(service: FlowService, args: ShowArgs) -> anyhow::Result<()> {
    let store = GraphStore::new(service);
    store
        .load(args.workflow)
        .await
        .with_context(|| format!("failed to load workflow {}", args.workflow))?;

    print!("{}", render(&store.snapshot()));
    Ok(())
}

fn port_list(ports: &[Port]) -> String {
    ports
        .iter()
        .map(|p| p.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(state: &GraphState) -> String {
    let mut out = String::new();

    if let Some(workflow) = &state.workflow {
        let published = if workflow.published { "published" } else { "draft" };
        out.push_str(&format!("{} ({published})\n", workflow.name));
    }

    out.push_str(&format!("\nnodes ({}):\n", state.nodes.len()));
    for node in &state.nodes {
        let ports = node.ports();
        out.push_str(&format!(
            "  {} [{}] {} at ({}, {})\n    in: {}\n    out: {}\n",
            node.name,
            node.kind(),
            node.id,
            node.position.x,
            node.position.y,
            port_list(&ports.inputs),
            port_list(&ports.outputs),
        ));
    }

    out.push_str(&format!("\nedges ({}):\n", state.edges.len()));
    for edge in &state.edges {
        let name = |id| state.node(id).map_or("?", |n| n.name.as_str());
        let marker = if state.is_edge_resolved(edge) { "" } else { " (unresolved)" };
        out.push_str(&format!(
            "  {}.{} -> {}.{}{marker}\n",
            name(edge.source_node_id),
            edge.source_port,
            name(edge.target_node_id),
            edge.target_port,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use flowdesk_core::graph::{Edge, Node, NodeKind, Position};
    use flowdesk_core::id::{EdgeId, NodeId};

    use super::*;

    #[test]
    fn test_render_marks_unresolved_edges() {
        let upload = Node::new(NodeId::new(), NodeKind::ManualUpload, "Upload", Position::default());
        let check = Node::new(NodeId::new(), NodeKind::ConditionalIf, "Check", Position::new(300.0, 0.0));
        let edge = |source_port: &str| Edge {
            id: EdgeId::new(),
            source_node_id: check.id,
            source_port: source_port.to_owned(),
            target_node_id: upload.id,
            target_port: "default".to_owned(),
        };

        let state = GraphState {
            workflow: None,
            nodes: vec![upload.clone(), check.clone()],
            edges: vec![edge("true"), edge("maybe")],
        };

        let out = render(&state);
        assert!(out.contains("out: true, false"));
        assert!(out.contains("Check.true -> Upload.default\n"));
        assert!(out.contains("Check.maybe -> Upload.default (unresolved)"));
    }
}
