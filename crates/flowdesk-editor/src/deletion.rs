//! Node deletion against documents still in flight.
//!
//! The remote system refuses to delete a node that holds documents unless
//! the deletion is forced, in which case the held documents move to the
//! orphaned area. A refusal is reported as a conflict outcome, not an error.

use flowdesk_core::id::NodeId;
use flowdesk_core::provider::{DeletionConflict, NodeDeletion};
use flowdesk_core::{Error, Result};

use crate::interaction::Selection;
use crate::store::GraphStore;

/// Tracing target for node deletion.
const TRACING_TARGET: &str = "flowdesk_editor::deletion";

/// Per-node outcome of deleting a selection.
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Nodes that were deleted.
    pub deleted: Vec<NodeId>,
    /// Nodes left in place because they hold documents.
    pub conflicts: Vec<(NodeId, DeletionConflict)>,
    /// Nodes whose deletion failed.
    pub failed: Vec<(NodeId, Error)>,
}

impl DeletionReport {
    /// Returns whether every node was deleted.
    pub fn is_complete(&self) -> bool {
        self.conflicts.is_empty() && self.failed.is_empty()
    }
}

/// Deletes nodes through the remote system and mirrors the result locally.
#[derive(Debug, Clone)]
pub struct DeletionCoordinator {
    store: GraphStore,
}

impl DeletionCoordinator {
    /// Creates a coordinator working on the given store.
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Deletes a node.
    ///
    /// On success the node and every edge touching it are removed in one
    /// state update. On conflict the graph is left untouched and the
    /// conflict is returned so the caller can offer a forced deletion.
    pub async fn delete_node(&self, node_id: NodeId, force: bool) -> Result<NodeDeletion> {
        let workflow_id = self.store.workflow_id()?;
        if !self.store.snapshot().contains_node(node_id) {
            return Err(Error::not_found().with_message(format!("node {node_id}")));
        }

        let outcome = self
            .store
            .service()
            .delete_node(workflow_id, node_id, force)
            .await?;

        match outcome {
            NodeDeletion::Deleted => {
                tracing::info!(
                    target: TRACING_TARGET,
                    node_id = %node_id,
                    force,
                    "Node deleted"
                );
                self.store.remove_node(workflow_id, node_id);
            }
            NodeDeletion::Conflict(conflict) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    node_id = %node_id,
                    held_count = conflict.held_count,
                    unrouted_count = conflict.unrouted_count,
                    "Node deletion needs confirmation"
                );
            }
        }

        Ok(outcome)
    }

    /// Deletes every selected node without forcing, one after the other.
    ///
    /// Deleted nodes are removed from the selection.
    pub async fn delete_selected(&self, selection: &mut Selection) -> DeletionReport {
        let mut report = DeletionReport::default();

        for node_id in selection.nodes().collect::<Vec<_>>() {
            match self.delete_node(node_id, false).await {
                Ok(NodeDeletion::Deleted) => {
                    selection.remove(node_id);
                    report.deleted.push(node_id);
                }
                Ok(NodeDeletion::Conflict(conflict)) => report.conflicts.push((node_id, conflict)),
                Err(error) => report.failed.push((node_id, error)),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use flowdesk_core::ErrorKind;
    use flowdesk_core::FlowService;
    use flowdesk_core::graph::{Node, NodeKind, Position};
    use flowdesk_core::id::WorkflowId;
    use flowdesk_test::{MockFlowProvider, MockOperation};

    use super::*;

    /// Upload -> Folder -> Output, loaded into a store.
    async fn setup() -> (MockFlowProvider, GraphStore, WorkflowId, [Node; 3]) {
        let mock = MockFlowProvider::default();
        let workflow = mock.insert_workflow("Invoices");
        let store = GraphStore::new(FlowService::new(mock.clone()));
        store.load(workflow.id).await.unwrap();

        let upload = store
            .add_node(NodeKind::ManualUpload, "Upload", Position::default())
            .await
            .unwrap();
        let folder = store
            .add_node(NodeKind::DocumentFolder, "Folder", Position::default())
            .await
            .unwrap();
        let output = store
            .add_node(NodeKind::HttpOutput, "Send", Position::default())
            .await
            .unwrap();
        store
            .connect(upload.id, "default", folder.id, "default")
            .await
            .unwrap();
        store
            .connect(folder.id, "default", output.id, "default")
            .await
            .unwrap();

        (mock, store, workflow.id, [upload, folder, output])
    }

    #[tokio::test]
    async fn test_conflict_leaves_graph_untouched() {
        let (mock, store, _, [_, folder, _]) = setup().await;
        mock.hold_documents(folder.id, 3, 1);
        let coordinator = DeletionCoordinator::new(store.clone());

        let before = store.snapshot();
        let outcome = coordinator.delete_node(folder.id, false).await.unwrap();

        assert_eq!(
            outcome,
            NodeDeletion::Conflict(DeletionConflict {
                held_count: 3,
                unrouted_count: 1
            })
        );
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_forced_deletion_removes_node_and_edges() {
        let (mock, store, workflow_id, [_, folder, _]) = setup().await;
        mock.hold_documents(folder.id, 3, 0);
        let coordinator = DeletionCoordinator::new(store.clone());

        let outcome = coordinator.delete_node(folder.id, true).await.unwrap();
        assert!(outcome.is_deleted());

        let state = store.snapshot();
        assert!(!state.contains_node(folder.id));
        assert!(state.edges.is_empty());
        assert_eq!(state.nodes.len(), 2);
        assert!(mock.edges(workflow_id).is_empty());
    }

    #[tokio::test]
    async fn test_removal_is_a_single_update() {
        let (_, store, _, [upload, _, _]) = setup().await;
        let coordinator = DeletionCoordinator::new(store.clone());
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        coordinator.delete_node(upload.id, false).await.unwrap();

        let state = rx.borrow_and_update().clone();
        assert!(!state.contains_node(upload.id));
        assert!(state.edges_touching(upload.id).next().is_none());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let (mock, store, _, [upload, _, _]) = setup().await;
        mock.fail_once(MockOperation::DeleteNode, ErrorKind::ServiceUnavailable);
        let coordinator = DeletionCoordinator::new(store.clone());

        let error = coordinator.delete_node(upload.id, false).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        assert!(store.snapshot().contains_node(upload.id));
    }

    #[tokio::test]
    async fn test_delete_selected_reports_per_node() {
        let (mock, store, _, [upload, folder, output]) = setup().await;
        mock.hold_documents(folder.id, 2, 0);
        let coordinator = DeletionCoordinator::new(store.clone());

        let mut selection = Selection::default();
        selection.select(upload.id);
        selection.select(folder.id);
        selection.select(output.id);

        let report = coordinator.delete_selected(&mut selection).await;
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].0, folder.id);
        assert!(!report.is_complete());

        assert_eq!(selection.nodes().collect::<Vec<_>>(), vec![folder.id]);
        assert_eq!(store.snapshot().nodes.len(), 1);
    }
}
