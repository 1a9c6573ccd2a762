//! Remote workflow API contract.
//!
//! [`FlowProvider`] is the boundary to the remote system that stores
//! workflows and executes runs. [`FlowService`] wraps any provider with
//! structured logging and cheap cloning.

mod request;
mod response;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub use request::{
    CreateEdge, CreateNode, CreateRun, CreateWorkflow, Retrigger, RunDocumentGroup, UpdateNode,
    UpdateWorkflow, UploadDocument,
};
pub use response::{DeletionConflict, NodeDeletion, UploadedDocument};

use crate::Result;
use crate::graph::{Edge, Node, Workflow};
use crate::id::{EdgeId, InstanceId, NodeId, RunId, WorkflowId};
use crate::run::{DocumentInstance, InspectorTab, NodeStatusCount, NodeSummary, Run};

/// Tracing target for remote API calls.
pub const TRACING_TARGET: &str = "flowdesk_core::provider";

/// Remote workflow API.
///
/// Implementations must be safe to share between the graph store and the
/// background pollers.
#[async_trait::async_trait]
pub trait FlowProvider: Send + Sync {
    /// Lists all workflows.
    async fn list_workflows(&self) -> Result<Vec<Workflow>>;

    /// Fetches one workflow.
    async fn get_workflow(&self, workflow_id: WorkflowId) -> Result<Workflow>;

    /// Creates a workflow.
    async fn create_workflow(&self, request: &CreateWorkflow) -> Result<Workflow>;

    /// Renames or (un)publishes a workflow.
    async fn update_workflow(
        &self,
        workflow_id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> Result<Workflow>;

    /// Deletes a workflow.
    async fn delete_workflow(&self, workflow_id: WorkflowId) -> Result<()>;

    /// Lists the nodes of a workflow.
    async fn list_nodes(&self, workflow_id: WorkflowId) -> Result<Vec<Node>>;

    /// Creates a node and returns it with its assigned id.
    async fn create_node(&self, workflow_id: WorkflowId, request: &CreateNode) -> Result<Node>;

    /// Applies a partial update to a node and returns the stored node.
    async fn update_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        request: &UpdateNode,
    ) -> Result<Node>;

    /// Deletes a node.
    ///
    /// Without `force`, a node still holding documents is left in place and
    /// [`NodeDeletion::Conflict`] is returned. With `force`, held documents
    /// are moved to the orphaned area.
    async fn delete_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        force: bool,
    ) -> Result<NodeDeletion>;

    /// Lists the edges of a workflow.
    async fn list_edges(&self, workflow_id: WorkflowId) -> Result<Vec<Edge>>;

    /// Creates an edge and returns it with its assigned id.
    async fn create_edge(&self, workflow_id: WorkflowId, request: &CreateEdge) -> Result<Edge>;

    /// Deletes an edge.
    async fn delete_edge(&self, workflow_id: WorkflowId, edge_id: EdgeId) -> Result<()>;

    /// Uploads a document for a later run.
    async fn upload_document(
        &self,
        workflow_id: WorkflowId,
        request: UploadDocument,
    ) -> Result<UploadedDocument>;

    /// Starts a run over previously uploaded documents.
    async fn create_run(&self, workflow_id: WorkflowId, request: &CreateRun) -> Result<Run>;

    /// Fetches a run.
    async fn get_run(&self, run_id: RunId) -> Result<Run>;

    /// Fetches the per-node, per-status document counts of a run.
    async fn get_run_node_counts(&self, run_id: RunId) -> Result<Vec<NodeStatusCount>>;

    /// Fetches per-node document counts across all runs of a workflow.
    async fn get_node_summary(&self, workflow_id: WorkflowId) -> Result<Vec<NodeSummary>>;

    /// Lists the document instances at a node for one inspector tab.
    async fn list_node_documents(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        tab: InspectorTab,
    ) -> Result<Vec<DocumentInstance>>;

    /// Lists document instances whose node was force-deleted.
    async fn list_orphaned_documents(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<DocumentInstance>>;

    /// Deletes a document instance.
    async fn delete_document(&self, workflow_id: WorkflowId, instance_id: InstanceId)
    -> Result<()>;

    /// Re-injects document instances into trigger nodes.
    async fn retrigger(&self, workflow_id: WorkflowId, request: &Retrigger) -> Result<()>;
}

/// Remote API wrapper with observability.
///
/// Every call is logged with its duration; failures are logged at `warn`.
/// The provider is wrapped in `Arc` so the service can be handed to
/// background tasks.
#[derive(Clone)]
pub struct FlowService {
    inner: Arc<dyn FlowProvider>,
}

impl fmt::Debug for FlowService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowService").finish_non_exhaustive()
    }
}

impl FlowService {
    /// Creates a new service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: FlowProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Creates a service wrapper around a shared provider.
    pub fn from_arc(provider: Arc<dyn FlowProvider>) -> Self {
        Self { inner: provider }
    }

    async fn observe<T, F>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started_at = Instant::now();
        let result = future.await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(_) => tracing::debug!(
                target: TRACING_TARGET,
                operation,
                elapsed_ms = elapsed.as_millis(),
                "Remote call completed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                operation,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Remote call failed"
            ),
        }

        result
    }

    /// Lists all workflows.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.observe("list_workflows", self.inner.list_workflows())
            .await
    }

    /// Fetches one workflow.
    pub async fn get_workflow(&self, workflow_id: WorkflowId) -> Result<Workflow> {
        self.observe("get_workflow", self.inner.get_workflow(workflow_id))
            .await
    }

    /// Creates a workflow.
    pub async fn create_workflow(&self, request: &CreateWorkflow) -> Result<Workflow> {
        self.observe("create_workflow", self.inner.create_workflow(request))
            .await
    }

    /// Renames or (un)publishes a workflow.
    pub async fn update_workflow(
        &self,
        workflow_id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> Result<Workflow> {
        self.observe(
            "update_workflow",
            self.inner.update_workflow(workflow_id, request),
        )
        .await
    }

    /// Deletes a workflow.
    pub async fn delete_workflow(&self, workflow_id: WorkflowId) -> Result<()> {
        self.observe("delete_workflow", self.inner.delete_workflow(workflow_id))
            .await
    }

    /// Lists the nodes of a workflow.
    pub async fn list_nodes(&self, workflow_id: WorkflowId) -> Result<Vec<Node>> {
        self.observe("list_nodes", self.inner.list_nodes(workflow_id))
            .await
    }

    /// Creates a node.
    pub async fn create_node(&self, workflow_id: WorkflowId, request: &CreateNode) -> Result<Node> {
        tracing::debug!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            node_type = %request.kind,
            "Creating node"
        );

        self.observe("create_node", self.inner.create_node(workflow_id, request))
            .await
    }

    /// Applies a partial update to a node.
    pub async fn update_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        request: &UpdateNode,
    ) -> Result<Node> {
        self.observe(
            "update_node",
            self.inner.update_node(workflow_id, node_id, request),
        )
        .await
    }

    /// Deletes a node, reporting a conflict when it still holds documents.
    pub async fn delete_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        force: bool,
    ) -> Result<NodeDeletion> {
        let outcome = self
            .observe(
                "delete_node",
                self.inner.delete_node(workflow_id, node_id, force),
            )
            .await?;

        if let NodeDeletion::Conflict(conflict) = &outcome {
            tracing::info!(
                target: TRACING_TARGET,
                node_id = %node_id,
                held_count = conflict.held_count,
                unrouted_count = conflict.unrouted_count,
                "Node deletion blocked by held documents"
            );
        }

        Ok(outcome)
    }

    /// Lists the edges of a workflow.
    pub async fn list_edges(&self, workflow_id: WorkflowId) -> Result<Vec<Edge>> {
        self.observe("list_edges", self.inner.list_edges(workflow_id))
            .await
    }

    /// Creates an edge.
    pub async fn create_edge(&self, workflow_id: WorkflowId, request: &CreateEdge) -> Result<Edge> {
        self.observe("create_edge", self.inner.create_edge(workflow_id, request))
            .await
    }

    /// Deletes an edge.
    pub async fn delete_edge(&self, workflow_id: WorkflowId, edge_id: EdgeId) -> Result<()> {
        self.observe("delete_edge", self.inner.delete_edge(workflow_id, edge_id))
            .await
    }

    /// Uploads a document for a later run.
    pub async fn upload_document(
        &self,
        workflow_id: WorkflowId,
        request: UploadDocument,
    ) -> Result<UploadedDocument> {
        tracing::debug!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            file_name = %request.file_name,
            size = request.content.len(),
            "Uploading document"
        );

        self.observe(
            "upload_document",
            self.inner.upload_document(workflow_id, request),
        )
        .await
    }

    /// Starts a run.
    pub async fn create_run(&self, workflow_id: WorkflowId, request: &CreateRun) -> Result<Run> {
        let run = self
            .observe("create_run", self.inner.create_run(workflow_id, request))
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            run_id = %run.id,
            groups = request.documents.len(),
            "Run created"
        );

        Ok(run)
    }

    /// Fetches a run.
    pub async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.observe("get_run", self.inner.get_run(run_id)).await
    }

    /// Fetches the per-node, per-status document counts of a run.
    pub async fn get_run_node_counts(&self, run_id: RunId) -> Result<Vec<NodeStatusCount>> {
        self.observe("get_run_node_counts", self.inner.get_run_node_counts(run_id))
            .await
    }

    /// Fetches per-node document counts across all runs of a workflow.
    pub async fn get_node_summary(&self, workflow_id: WorkflowId) -> Result<Vec<NodeSummary>> {
        self.observe("get_node_summary", self.inner.get_node_summary(workflow_id))
            .await
    }

    /// Lists the document instances at a node for one inspector tab.
    pub async fn list_node_documents(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        tab: InspectorTab,
    ) -> Result<Vec<DocumentInstance>> {
        self.observe(
            "list_node_documents",
            self.inner.list_node_documents(workflow_id, node_id, tab),
        )
        .await
    }

    /// Lists orphaned document instances.
    pub async fn list_orphaned_documents(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<DocumentInstance>> {
        self.observe(
            "list_orphaned_documents",
            self.inner.list_orphaned_documents(workflow_id),
        )
        .await
    }

    /// Deletes a document instance.
    pub async fn delete_document(
        &self,
        workflow_id: WorkflowId,
        instance_id: InstanceId,
    ) -> Result<()> {
        self.observe(
            "delete_document",
            self.inner.delete_document(workflow_id, instance_id),
        )
        .await
    }

    /// Re-injects document instances into trigger nodes.
    pub async fn retrigger(&self, workflow_id: WorkflowId, request: &Retrigger) -> Result<()> {
        self.observe("retrigger", self.inner.retrigger(workflow_id, request))
            .await
    }
}
