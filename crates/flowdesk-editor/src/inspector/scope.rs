//! What an inspector is looking at.

use flowdesk_core::graph::{Node, NodeKind};
use flowdesk_core::id::NodeId;
use flowdesk_core::run::InspectorTab;
use flowdesk_core::{Error, Result};

/// Document collection browsed by a [`NodeInspector`](super::NodeInspector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectorScope {
    /// Documents at one node under one tab.
    Node {
        /// Inspected node.
        node_id: NodeId,
        /// Selected tab.
        tab: InspectorTab,
    },
    /// Documents that lost their node, workflow-wide.
    Orphaned,
}

impl InspectorScope {
    /// Creates a node scope, rejecting tabs the node type does not have.
    pub fn for_node(node: &Node, tab: InspectorTab) -> Result<Self> {
        if !available_tabs(node.kind()).contains(&tab) {
            return Err(Error::invalid_input().with_message(format!(
                "{} nodes have no `{tab}` tab",
                node.kind().label()
            )));
        }

        Ok(Self::Node {
            node_id: node.id,
            tab,
        })
    }

    /// Returns the inspected node, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Node { node_id, .. } => Some(*node_id),
            Self::Orphaned => None,
        }
    }
}

/// Returns the inspector tabs a node type has, in display order.
pub fn available_tabs(kind: NodeKind) -> Vec<InspectorTab> {
    if kind.can_hold_documents() {
        vec![InspectorTab::Processing, InspectorTab::Held, InspectorTab::Failed]
    } else {
        vec![InspectorTab::Processing, InspectorTab::Failed]
    }
}

#[cfg(test)]
mod tests {
    use flowdesk_core::ErrorKind;
    use flowdesk_core::graph::Position;

    use super::*;

    #[test]
    fn test_held_tab_only_for_holding_types() {
        let folder = Node::new(NodeId::new(), NodeKind::DocumentFolder, "Inbox", Position::default());
        let extractor = Node::new(NodeId::new(), NodeKind::Extractor, "Extract", Position::default());

        assert!(InspectorScope::for_node(&folder, InspectorTab::Held).is_ok());
        let error = InspectorScope::for_node(&extractor, InspectorTab::Held).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);

        let scope = InspectorScope::for_node(&extractor, InspectorTab::Failed).unwrap();
        assert_eq!(scope.node_id(), Some(extractor.id));
    }

    #[test]
    fn test_tab_order() {
        assert_eq!(
            available_tabs(NodeKind::Reconciliation),
            vec![InspectorTab::Processing, InspectorTab::Held, InspectorTab::Failed]
        );
        assert_eq!(available_tabs(NodeKind::Webhook).len(), 2);
    }
}
