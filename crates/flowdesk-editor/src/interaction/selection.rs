//! Node selection.

use std::collections::BTreeSet;

use flowdesk_core::id::NodeId;

use crate::store::GraphState;

/// Set of selected nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: BTreeSet<NodeId>,
}

impl Selection {
    /// Adds a node to the selection.
    pub fn select(&mut self, node_id: NodeId) {
        self.nodes.insert(node_id);
    }

    /// Replaces the selection with a single node.
    pub fn select_only(&mut self, node_id: NodeId) {
        self.nodes.clear();
        self.nodes.insert(node_id);
    }

    /// Adds or removes a node.
    pub fn toggle(&mut self, node_id: NodeId) {
        if !self.nodes.remove(&node_id) {
            self.nodes.insert(node_id);
        }
    }

    /// Removes a node from the selection.
    pub fn remove(&mut self, node_id: NodeId) -> bool {
        self.nodes.remove(&node_id)
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Returns whether a node is selected.
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Returns whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of selected nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over the selected nodes.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Drops nodes that no longer exist in the graph.
    pub fn retain_existing(&mut self, state: &GraphState) {
        self.nodes.retain(|id| state.contains_node(*id));
    }
}
