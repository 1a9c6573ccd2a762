//! Snapshot of one workflow's graph.

use flowdesk_core::graph::{Edge, Node, NodePorts, Position, Workflow};
use flowdesk_core::id::{EdgeId, NodeId};

/// Whole-graph snapshot published by the [`GraphStore`](super::GraphStore).
///
/// Readers only ever see complete snapshots; every mutation replaces or
/// edits the state in a single update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphState {
    /// Loaded workflow, if any.
    pub workflow: Option<Workflow>,
    /// Nodes in load and creation order.
    pub nodes: Vec<Node>,
    /// Edges in load and creation order.
    pub edges: Vec<Edge>,
}

impl GraphState {
    /// Returns whether a workflow is loaded.
    pub fn is_loaded(&self) -> bool {
        self.workflow.is_some()
    }

    /// Returns the node with the given id.
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    /// Returns whether a node with the given id exists.
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some()
    }

    /// Returns the edge with the given id.
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    /// Returns every edge attached to the given node.
    pub fn edges_touching(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Resolves the current ports of a node.
    pub fn ports(&self, node_id: NodeId) -> Option<NodePorts> {
        self.node(node_id).map(Node::ports)
    }

    /// Returns whether both ends of an edge match currently resolved ports.
    ///
    /// Unresolved edges are kept but never highlighted.
    pub fn is_edge_resolved(&self, edge: &Edge) -> bool {
        let source = self
            .ports(edge.source_node_id)
            .is_some_and(|p| p.output(&edge.source_port).is_some());
        let target = self
            .ports(edge.target_node_id)
            .is_some_and(|p| p.input(&edge.target_port).is_some());
        source && target
    }

    /// Returns the positions of all nodes, used for placement.
    pub fn positions(&self) -> Vec<Position> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    /// Returns the trigger nodes in order.
    pub fn trigger_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_trigger())
    }

    /// Removes a node and every edge touching it.
    pub(crate) fn remove_node(&mut self, node_id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != node_id);
        self.edges.retain(|e| !e.touches(node_id));
        self.nodes.len() != before
    }
}

#[cfg(test)]
mod tests {
    use flowdesk_core::graph::{
        ConditionalSwitchConfig, NodeConfig, NodeKind, SwitchCase,
    };

    use super::*;

    fn edge(source: &Node, source_port: &str, target: &Node, target_port: &str) -> Edge {
        Edge {
            id: EdgeId::new(),
            source_node_id: source.id,
            source_port: source_port.into(),
            target_node_id: target.id,
            target_port: target_port.into(),
        }
    }

    #[test]
    fn test_edge_resolution_follows_config() {
        let upload = Node::new(NodeId::new(), NodeKind::ManualUpload, "Upload", Position::default());
        let switch = Node::new(NodeId::new(), NodeKind::ConditionalSwitch, "Route", Position::default())
            .with_config(NodeConfig::ConditionalSwitch(ConditionalSwitchConfig {
                cases: vec![SwitchCase::new("case_1"), SwitchCase::new("case_2")],
            }));
        let sink = Node::new(NodeId::new(), NodeKind::HttpOutput, "Send", Position::default());

        let mut state = GraphState {
            workflow: None,
            nodes: vec![upload.clone(), switch.clone(), sink.clone()],
            edges: vec![
                edge(&upload, "default", &switch, "default"),
                edge(&switch, "case_2", &sink, "default"),
            ],
        };
        assert!(state.edges.iter().all(|e| state.is_edge_resolved(e)));

        // Removing the case leaves its edge in place but unresolved.
        state.node_mut(switch.id).unwrap().config =
            NodeConfig::ConditionalSwitch(ConditionalSwitchConfig {
                cases: vec![SwitchCase::new("case_1")],
            });
        assert!(state.is_edge_resolved(&state.edges[0]));
        assert!(!state.is_edge_resolved(&state.edges[1]));
    }

    #[test]
    fn test_remove_node_drops_touching_edges() {
        let a = Node::new(NodeId::new(), NodeKind::ManualUpload, "A", Position::default());
        let b = Node::new(NodeId::new(), NodeKind::Extractor, "B", Position::default());
        let c = Node::new(NodeId::new(), NodeKind::HttpOutput, "C", Position::default());

        let mut state = GraphState {
            workflow: None,
            nodes: vec![a.clone(), b.clone(), c.clone()],
            edges: vec![
                edge(&a, "default", &b, "default"),
                edge(&b, "default", &c, "default"),
            ],
        };

        assert!(state.remove_node(b.id));
        assert_eq!(state.nodes.len(), 2);
        assert!(state.edges.is_empty());
        assert!(!state.remove_node(b.id));
    }
}
