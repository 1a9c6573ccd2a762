//! Connection drafts.
//!
//! A draft starts when the user drags from a port. Releasing over another
//! port connects the two; releasing over empty canvas opens the node-type
//! picker, and confirming a type creates the node at the release point and
//! wires it to the origin port.
//!
//! ```text
//! Idle --begin_drag--> Dragging --release_over_port--> Idle
//!                         |
//!                 release_over_canvas
//!                         v
//!               AwaitingTargetType --confirm/cancel--> Idle
//! ```

use flowdesk_core::graph::{Edge, Node, NodeKind, PortRole, Position};
use flowdesk_core::id::NodeId;
use flowdesk_core::{Error, Result};

use crate::store::GraphStore;

/// Tracing target for connection drafts.
const TRACING_TARGET: &str = "flowdesk_editor::draft";

/// An in-progress connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDraft {
    /// Node the drag started from.
    pub origin_node_id: NodeId,
    /// Port the drag started from.
    pub origin_port: String,
    /// Side of the edge the origin port is on.
    pub origin_role: PortRole,
    /// Pointer position, and the new node's position once released.
    pub position: Position,
    /// Node type highlighted in the picker.
    pub selected_kind: Option<NodeKind>,
}

/// State of the draft controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DraftState {
    /// No draft.
    #[default]
    Idle,
    /// A connection is being dragged.
    Dragging(ConnectionDraft),
    /// The drag was released over empty canvas; the picker is open.
    AwaitingTargetType(ConnectionDraft),
}

impl DraftState {
    /// Returns the active draft, if any.
    pub fn draft(&self) -> Option<&ConnectionDraft> {
        match self {
            Self::Idle => None,
            Self::Dragging(draft) | Self::AwaitingTargetType(draft) => Some(draft),
        }
    }

    /// Returns whether no draft is active.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Drives the drag, drop, pick, create and auto-connect flow.
#[derive(Debug)]
pub struct ConnectionDraftController {
    store: GraphStore,
    state: DraftState,
}

impl ConnectionDraftController {
    /// Creates an idle controller working on the given store.
    pub fn new(store: GraphStore) -> Self {
        Self {
            store,
            state: DraftState::Idle,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// Starts dragging a connection from a port.
    ///
    /// Fails with an invalid-state error when a draft is already active and
    /// with an invalid-input error when the node or port does not exist.
    pub fn begin_drag(&mut self, node_id: NodeId, port: &str, role: PortRole) -> Result<()> {
        if !self.state.is_idle() {
            return Err(Error::invalid_state().with_message("a connection draft is already active"));
        }

        let snapshot = self.store.snapshot();
        let node = snapshot
            .node(node_id)
            .ok_or_else(|| Error::invalid_input().with_message(format!("unknown node {node_id}")))?;

        let ports = node.ports();
        if !ports.side(role).iter().any(|p| p.id == port) {
            return Err(Error::invalid_input()
                .with_message(format!("node {node_id} has no {role} port `{port}`")));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node_id,
            port,
            role = %role,
            "Connection drag started"
        );

        self.state = DraftState::Dragging(ConnectionDraft {
            origin_node_id: node_id,
            origin_port: port.to_owned(),
            origin_role: role,
            position: node.position,
            selected_kind: None,
        });
        Ok(())
    }

    /// Tracks the pointer while dragging.
    pub fn update_position(&mut self, position: Position) {
        if let DraftState::Dragging(draft) = &mut self.state {
            draft.position = position;
        }
    }

    /// Completes the drag over a port of another node and connects the two.
    ///
    /// The controller returns to idle whether or not the connection succeeds.
    pub async fn release_over_port(&mut self, node_id: NodeId, port: &str) -> Result<Edge> {
        let DraftState::Dragging(draft) = std::mem::take(&mut self.state) else {
            return Err(Error::invalid_state().with_message("no connection is being dragged"));
        };

        self.connect(&draft, node_id, port).await
    }

    /// Completes the drag over empty canvas and opens the node-type picker.
    pub fn release_over_canvas(&mut self, position: Position) -> Result<()> {
        let DraftState::Dragging(mut draft) = std::mem::take(&mut self.state) else {
            return Err(Error::invalid_state().with_message("no connection is being dragged"));
        };

        draft.position = position;
        self.state = DraftState::AwaitingTargetType(draft);
        Ok(())
    }

    /// Highlights a node type in the picker.
    pub fn select_type(&mut self, kind: NodeKind) -> Result<()> {
        match &mut self.state {
            DraftState::AwaitingTargetType(draft) => {
                draft.selected_kind = Some(kind);
                Ok(())
            }
            _ => Err(Error::invalid_state().with_message("the node-type picker is not open")),
        }
    }

    /// Creates a node of the selected type and connects it to the origin.
    ///
    /// The new node is connected through its first port on the side opposite
    /// the origin. The controller returns to idle in all cases; if the
    /// connection fails, the created node is kept and the error returned.
    pub async fn confirm(&mut self) -> Result<(Node, Edge)> {
        let draft = match std::mem::take(&mut self.state) {
            DraftState::AwaitingTargetType(draft) => draft,
            other => {
                self.state = other;
                return Err(Error::invalid_state().with_message("the node-type picker is not open"));
            }
        };

        let kind = draft
            .selected_kind
            .ok_or_else(|| Error::invalid_input().with_message("no node type selected"))?;

        let node = self
            .store
            .add_node(kind, kind.label(), draft.position)
            .await?;

        let ports = node.ports();
        let port = ports
            .default_port(draft.origin_role.opposite())
            .ok_or_else(|| {
                Error::internal_error().with_message(format!("{kind} node exposes no ports"))
            })?;

        let edge = self.connect(&draft, node.id, &port.id).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node.id,
            node_type = %kind,
            edge_id = %edge.id,
            "Node created from connection draft"
        );

        Ok((node, edge))
    }

    /// Selects `kind` and confirms in one step.
    pub async fn confirm_type(&mut self, kind: NodeKind) -> Result<(Node, Edge)> {
        self.select_type(kind)?;
        self.confirm().await
    }

    /// Discards the draft without persisting anything.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            tracing::debug!(target: TRACING_TARGET, "Connection draft cancelled");
        }
        self.state = DraftState::Idle;
    }

    /// Connects the draft's origin with `port` on `node_id`, oriented by the
    /// origin's role.
    async fn connect(&self, draft: &ConnectionDraft, node_id: NodeId, port: &str) -> Result<Edge> {
        match draft.origin_role {
            PortRole::Source => {
                self.store
                    .connect(draft.origin_node_id, &draft.origin_port, node_id, port)
                    .await
            }
            PortRole::Target => {
                self.store
                    .connect(node_id, port, draft.origin_node_id, &draft.origin_port)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use flowdesk_core::ErrorKind;
    use flowdesk_core::FlowService;
    use flowdesk_core::id::WorkflowId;
    use flowdesk_test::{MockFlowProvider, MockOperation};

    use super::*;

    async fn setup() -> (MockFlowProvider, GraphStore, WorkflowId, Node) {
        let mock = MockFlowProvider::default();
        let workflow = mock.insert_workflow("Invoices");
        let store = GraphStore::new(FlowService::new(mock.clone()));
        store.load(workflow.id).await.unwrap();

        let upload = store
            .add_node(NodeKind::ManualUpload, "Upload", Position::default())
            .await
            .unwrap();
        (mock, store, workflow.id, upload)
    }

    #[tokio::test]
    async fn test_release_over_canvas_then_confirm() {
        let (_, store, _, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store.clone());

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        controller
            .release_over_canvas(Position::new(400.0, 0.0))
            .unwrap();
        let (node, edge) = controller
            .confirm_type(NodeKind::ConditionalIf)
            .await
            .unwrap();

        assert!(controller.state().is_idle());
        assert_eq!(node.position, Position::new(400.0, 0.0));
        assert_eq!(edge.source_node_id, upload.id);
        assert_eq!(edge.target_node_id, node.id);
        assert_eq!(edge.target_port, "default");
        assert!(store.is_edge_resolved(&edge));
    }

    #[tokio::test]
    async fn test_drag_from_target_port_wires_new_node_as_source() {
        let (_, store, _, _) = setup().await;
        let check = store
            .add_node(NodeKind::ConditionalIf, "Check", Position::new(400.0, 0.0))
            .await
            .unwrap();
        let mut controller = ConnectionDraftController::new(store);

        controller
            .begin_drag(check.id, "default", PortRole::Target)
            .unwrap();
        controller
            .release_over_canvas(Position::new(0.0, 300.0))
            .unwrap();
        let (node, edge) = controller
            .confirm_type(NodeKind::Extractor)
            .await
            .unwrap();

        assert_eq!(edge.source_node_id, node.id);
        assert_eq!(edge.source_port, "default");
        assert_eq!(edge.target_node_id, check.id);
    }

    #[tokio::test]
    async fn test_select_then_cancel_persists_nothing() {
        let (mock, store, workflow_id, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store.clone());

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        controller
            .release_over_canvas(Position::new(400.0, 0.0))
            .unwrap();
        controller.select_type(NodeKind::Extractor).unwrap();
        controller.cancel();

        assert!(controller.state().is_idle());
        assert_eq!(store.snapshot().nodes.len(), 1);
        assert_eq!(mock.nodes(workflow_id).len(), 1);
        assert_eq!(mock.calls(MockOperation::CreateNode), 1);
    }

    #[tokio::test]
    async fn test_release_over_port_connects() {
        let (_, store, _, upload) = setup().await;
        let extract = store
            .add_node(NodeKind::Extractor, "Extract", Position::new(400.0, 0.0))
            .await
            .unwrap();
        let mut controller = ConnectionDraftController::new(store.clone());

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        controller.update_position(Position::new(390.0, 10.0));
        let edge = controller
            .release_over_port(extract.id, "default")
            .await
            .unwrap();

        assert!(controller.state().is_idle());
        assert_eq!(store.snapshot().edges, vec![edge]);
    }

    #[tokio::test]
    async fn test_second_drag_is_rejected() {
        let (_, store, _, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store);

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        let error = controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert!(matches!(controller.state(), DraftState::Dragging(_)));
    }

    #[tokio::test]
    async fn test_unknown_port_is_rejected() {
        let (_, store, _, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store);

        let error = controller
            .begin_drag(upload.id, "true", PortRole::Source)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(controller.state().is_idle());
    }

    #[tokio::test]
    async fn test_failed_confirm_returns_to_idle() {
        let (mock, store, _, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store.clone());
        mock.fail_once(MockOperation::CreateNode, ErrorKind::NetworkError);

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        controller
            .release_over_canvas(Position::new(400.0, 0.0))
            .unwrap();
        let error = controller
            .confirm_type(NodeKind::Extractor)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert!(controller.state().is_idle());
        assert_eq!(store.snapshot().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_without_type_returns_to_idle() {
        let (_, store, _, upload) = setup().await;
        let mut controller = ConnectionDraftController::new(store);

        controller
            .begin_drag(upload.id, "default", PortRole::Source)
            .unwrap();
        controller.release_over_canvas(Position::default()).unwrap();

        let error = controller.confirm().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(controller.state().is_idle());
    }
}
