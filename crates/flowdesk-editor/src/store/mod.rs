//! Graph store.
//!
//! [`GraphStore`] owns the canonical nodes and edges of one workflow and
//! publishes them as [`GraphState`] snapshots over a watch channel.
//!
//! Structural mutations are remote-first: the remote call is made, and the
//! local state changes only once it is acknowledged. A failed call leaves the
//! local state untouched. Moving a node is the exception: the new position is
//! applied immediately and persisted in the background.

mod catalogue;
mod state;

use std::sync::Arc;

pub use catalogue::{CataloguePayload, catalogue};
use flowdesk_core::graph::{Edge, Node, NodeConfig, NodeKind, NodePorts, Position, Workflow, place};
use flowdesk_core::id::{EdgeId, NodeId, WorkflowId};
use flowdesk_core::provider::{CreateEdge, CreateNode, UpdateNode, UpdateWorkflow};
use flowdesk_core::{Error, FlowService, Result};
pub use state::GraphState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Tracing target for graph store operations.
const TRACING_TARGET: &str = "flowdesk_editor::store";

/// Partial node edit applied with [`GraphStore::update_node`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEdit {
    /// New display name.
    pub name: Option<String>,
    /// New configuration; must belong to the node's type.
    pub config: Option<NodeConfig>,
}

impl NodeEdit {
    /// Renames the node.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            config: None,
        }
    }

    /// Replaces the node's configuration.
    #[must_use]
    pub fn config(config: NodeConfig) -> Self {
        Self {
            name: None,
            config: Some(config),
        }
    }
}

struct GraphStoreInner {
    service: FlowService,
    state: watch::Sender<GraphState>,
}

/// Owner of one workflow's graph.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<GraphStoreInner>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("GraphStore")
            .field("workflow", &state.workflow.as_ref().map(|w| w.id))
            .field("nodes", &state.nodes.len())
            .field("edges", &state.edges.len())
            .finish_non_exhaustive()
    }
}

impl GraphStore {
    /// Creates an empty store backed by the given remote service.
    pub fn new(service: FlowService) -> Self {
        let inner = GraphStoreInner {
            service,
            state: watch::Sender::new(GraphState::default()),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the remote service.
    pub fn service(&self) -> &FlowService {
        &self.inner.service
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> GraphState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<GraphState> {
        self.inner.state.subscribe()
    }

    /// Returns the loaded workflow's id.
    pub fn workflow_id(&self) -> Result<WorkflowId> {
        self.inner
            .state
            .borrow()
            .workflow
            .as_ref()
            .map(|w| w.id)
            .ok_or_else(|| Error::invalid_state().with_message("no workflow loaded"))
    }

    /// Resolves the current ports of a node.
    pub fn ports(&self, node_id: NodeId) -> Option<NodePorts> {
        self.inner.state.borrow().ports(node_id)
    }

    /// Returns whether both ends of an edge match currently resolved ports.
    pub fn is_edge_resolved(&self, edge: &Edge) -> bool {
        self.inner.state.borrow().is_edge_resolved(edge)
    }

    /// Applies `f` only if `workflow_id` is still the loaded workflow.
    ///
    /// Acknowledgments that arrive after another workflow was loaded are
    /// dropped.
    fn apply(&self, workflow_id: WorkflowId, f: impl FnOnce(&mut GraphState)) -> bool {
        self.apply_if(workflow_id, |state| {
            f(state);
            true
        })
    }

    /// Like [`apply`](Self::apply), but `f` reports whether it changed the
    /// state and subscribers are only notified if it did.
    fn apply_if(&self, workflow_id: WorkflowId, f: impl FnOnce(&mut GraphState) -> bool) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.workflow.as_ref().map(|w| w.id) != Some(workflow_id) {
                tracing::debug!(
                    target: TRACING_TARGET,
                    workflow_id = %workflow_id,
                    "Dropping update for a workflow that is no longer loaded"
                );
                return false;
            }

            f(state)
        })
    }

    /// Loads a workflow with its nodes and edges, replacing the current state.
    pub async fn load(&self, workflow_id: WorkflowId) -> Result<()> {
        let service = self.service();
        let (workflow, nodes, edges) = tokio::try_join!(
            service.get_workflow(workflow_id),
            service.list_nodes(workflow_id),
            service.list_edges(workflow_id),
        )?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            nodes = nodes.len(),
            edges = edges.len(),
            "Workflow loaded"
        );

        self.inner.state.send_replace(GraphState {
            workflow: Some(workflow),
            nodes,
            edges,
        });
        Ok(())
    }

    /// Creates a node near `position` without overlapping existing nodes.
    pub async fn add_node(
        &self,
        kind: NodeKind,
        name: impl Into<String>,
        position: Position,
    ) -> Result<Node> {
        let workflow_id = self.workflow_id()?;
        let placement = place(&self.snapshot().positions(), position);

        if !placement.is_free {
            tracing::debug!(
                target: TRACING_TARGET,
                attempts = placement.attempts,
                "No free position found, placing node over existing nodes"
            );
        }

        let request = CreateNode::new(kind, name, placement.position);
        let node = self.service().create_node(workflow_id, &request).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node.id,
            node_type = %node.kind(),
            x = node.position.x,
            y = node.position.y,
            "Node added"
        );

        self.apply(workflow_id, |state| state.nodes.push(node.clone()));
        Ok(node)
    }

    /// Creates a node from a catalogue drag payload dropped at `position`.
    pub async fn drop_from_catalogue(
        &self,
        payload: &CataloguePayload,
        position: Position,
    ) -> Result<Node> {
        self.add_node(payload.kind, payload.display_name(), position)
            .await
    }

    /// Renames a node or replaces its configuration.
    ///
    /// The acknowledged node replaces the local one, so its ports are
    /// re-resolved from the configuration the remote system stored.
    pub async fn update_node(&self, node_id: NodeId, edit: NodeEdit) -> Result<Node> {
        let workflow_id = self.workflow_id()?;
        let current = self
            .snapshot()
            .node(node_id)
            .cloned()
            .ok_or_else(|| Error::not_found().with_message(format!("node {node_id}")))?;

        let mut request = UpdateNode::default();
        if let Some(name) = edit.name {
            request = request.with_name(name);
        }
        if let Some(config) = &edit.config {
            if config.kind() != current.kind() {
                return Err(Error::invalid_input().with_message(format!(
                    "{} configuration cannot be applied to a {} node",
                    config.kind(),
                    current.kind()
                )));
            }
            request = request.with_config(config)?;
        }

        if request.is_empty() {
            return Ok(current);
        }

        let node = self
            .service()
            .update_node(workflow_id, node_id, &request)
            .await?;

        self.apply(workflow_id, |state| {
            if let Some(slot) = state.node_mut(node_id) {
                *slot = node.clone();
            }
        });
        Ok(node)
    }

    /// Connects an output port to an input port.
    ///
    /// Both nodes must exist locally; port ids are not checked, so an edge to
    /// a port that does not currently resolve is accepted and stays
    /// unresolved. If either node is removed while the request is in flight,
    /// the acknowledged edge is not added to the local graph.
    pub async fn connect(
        &self,
        source_node_id: NodeId,
        source_port: &str,
        target_node_id: NodeId,
        target_port: &str,
    ) -> Result<Edge> {
        let workflow_id = self.workflow_id()?;
        {
            let state = self.inner.state.borrow();
            for node_id in [source_node_id, target_node_id] {
                if !state.contains_node(node_id) {
                    return Err(
                        Error::invalid_input().with_message(format!("unknown node {node_id}"))
                    );
                }
            }
        }

        let request = CreateEdge::new(source_node_id, source_port, target_node_id, target_port);
        let edge = self.service().create_edge(workflow_id, &request).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            edge_id = %edge.id,
            source = %edge.source_node_id,
            source_port = %edge.source_port,
            target = %edge.target_node_id,
            target_port = %edge.target_port,
            "Nodes connected"
        );

        let added = self.apply_if(workflow_id, |state| {
            if !state.contains_node(edge.source_node_id) || !state.contains_node(edge.target_node_id)
            {
                return false;
            }
            state.edges.push(edge.clone());
            true
        });
        if !added {
            tracing::debug!(
                target: TRACING_TARGET,
                edge_id = %edge.id,
                "Edge endpoint removed before the edge was acknowledged"
            );
        }
        Ok(edge)
    }

    /// Moves a node.
    ///
    /// The position changes locally at once; persistence runs in the
    /// background and a failure is only logged. The returned handle may be
    /// dropped.
    pub fn move_node(&self, node_id: NodeId, position: Position) -> Result<JoinHandle<()>> {
        let workflow_id = self.workflow_id()?;
        if !self.inner.state.borrow().contains_node(node_id) {
            return Err(Error::not_found().with_message(format!("node {node_id}")));
        }

        self.apply(workflow_id, |state| {
            if let Some(node) = state.node_mut(node_id) {
                node.position = position;
            }
        });

        let service = self.service().clone();
        let request = UpdateNode::position(position);
        Ok(tokio::spawn(async move {
            if let Err(error) = service.update_node(workflow_id, node_id, &request).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    node_id = %node_id,
                    error = %error,
                    "Failed to persist node position"
                );
            }
        }))
    }

    /// Deletes an edge.
    pub async fn delete_edge(&self, edge_id: EdgeId) -> Result<()> {
        let workflow_id = self.workflow_id()?;
        self.service().delete_edge(workflow_id, edge_id).await?;

        self.apply(workflow_id, |state| state.edges.retain(|e| e.id != edge_id));
        Ok(())
    }

    /// Renames the loaded workflow.
    pub async fn rename_workflow(&self, name: impl Into<String>) -> Result<Workflow> {
        let workflow_id = self.workflow_id()?;
        let request = UpdateWorkflow::rename(name);
        self.update_workflow(workflow_id, &request).await
    }

    /// Flips the loaded workflow's publication state.
    pub async fn toggle_publish(&self) -> Result<Workflow> {
        let workflow_id = self.workflow_id()?;
        let published = self
            .inner
            .state
            .borrow()
            .workflow
            .as_ref()
            .is_some_and(|w| w.published);

        let request = UpdateWorkflow::publish(!published);
        self.update_workflow(workflow_id, &request).await
    }

    async fn update_workflow(
        &self,
        workflow_id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> Result<Workflow> {
        let workflow = self
            .service()
            .update_workflow(workflow_id, request)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            name = %workflow.name,
            published = workflow.published,
            "Workflow updated"
        );

        self.apply(workflow_id, |state| state.workflow = Some(workflow.clone()));
        Ok(workflow)
    }

    /// Removes a node and its edges locally after the remote deleted it.
    pub(crate) fn remove_node(&self, workflow_id: WorkflowId, node_id: NodeId) {
        self.apply(workflow_id, |state| {
            state.remove_node(node_id);
        });
    }
}
