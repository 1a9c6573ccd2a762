//! In-memory mock of the remote workflow API.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flowdesk_core::graph::{Edge, Node, NodeConfig, Position, Workflow};
use flowdesk_core::id::{DocumentId, EdgeId, InstanceId, NodeId, RunId, WorkflowId};
use flowdesk_core::provider::{
    CreateEdge, CreateNode, CreateRun, CreateWorkflow, DeletionConflict, NodeDeletion, Retrigger,
    UpdateNode, UpdateWorkflow, UploadDocument, UploadedDocument,
};
use flowdesk_core::run::{
    DocumentInstance, InspectorTab, NodeStatusCount, NodeSummary, Run, RunStatus,
};
use flowdesk_core::{Error, ErrorKind, FlowProvider, Result};

use super::state::{MockState, RunProgress};
use super::{MockFlowConfig, MockOperation};
use crate::TRACING_TARGET;

/// In-memory implementation of [`FlowProvider`].
///
/// Clones share the same state, so a test can keep one handle for scripting
/// and assertions while another is wrapped in a service.
#[derive(Clone, Default)]
pub struct MockFlowProvider {
    config: MockFlowConfig,
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockFlowProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFlowProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MockFlowProvider {
    /// Creates a new mock provider with the given configuration.
    pub fn new(config: MockFlowConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, operation: MockOperation) -> Result<()> {
        if let Some(latency) = self.config.latency() {
            tokio::time::sleep(latency).await;
        }

        tracing::trace!(target: TRACING_TARGET, operation = %operation, "Mock call");
        self.state().enter(operation)
    }

    /// Stores a new workflow.
    pub fn insert_workflow(&self, name: impl Into<String>) -> Workflow {
        let workflow = Workflow {
            id: WorkflowId::new(),
            name: name.into(),
            published: false,
        };

        self.state()
            .workflows
            .insert(workflow.id, workflow.clone());
        workflow
    }

    /// Stores a node as-is.
    pub fn insert_node(&self, workflow_id: WorkflowId, node: Node) -> Node {
        self.state()
            .nodes
            .entry(workflow_id)
            .or_default()
            .push(node.clone());
        node
    }

    /// Stores an edge between two ports.
    pub fn insert_edge(
        &self,
        workflow_id: WorkflowId,
        source_node_id: NodeId,
        source_port: &str,
        target_node_id: NodeId,
        target_port: &str,
    ) -> Edge {
        let edge = Edge {
            id: EdgeId::new(),
            source_node_id,
            source_port: source_port.to_owned(),
            target_node_id,
            target_port: target_port.to_owned(),
        };

        self.state()
            .edges
            .entry(workflow_id)
            .or_default()
            .push(edge.clone());
        edge
    }

    /// Returns the stored workflow.
    pub fn workflow(&self, workflow_id: WorkflowId) -> Option<Workflow> {
        self.state().workflows.get(&workflow_id).cloned()
    }

    /// Returns the stored nodes of a workflow.
    pub fn nodes(&self, workflow_id: WorkflowId) -> Vec<Node> {
        self.state()
            .nodes
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the stored edges of a workflow.
    pub fn edges(&self, workflow_id: WorkflowId) -> Vec<Edge> {
        self.state()
            .edges
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Marks a node as holding documents so non-forced deletion conflicts.
    pub fn hold_documents(&self, node_id: NodeId, held_count: u32, unrouted_count: u32) {
        self.state().held.insert(
            node_id,
            DeletionConflict {
                held_count,
                unrouted_count,
            },
        );
    }

    /// Sets the status new runs start in. Defaults to running.
    pub fn set_initial_run_status(&self, status: RunStatus) {
        self.state().initial_run_status = status;
    }

    /// Returns the most recently created run.
    pub fn latest_run(&self) -> Option<RunId> {
        self.state().latest_run
    }

    /// Replaces the reported status and node counts of a run.
    pub fn set_run_progress(
        &self,
        run_id: RunId,
        status: RunStatus,
        counts: Vec<NodeStatusCount>,
    ) -> Result<()> {
        let mut state = self.state();
        let progress = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| Error::not_found().with_message(format!("run {run_id}")))?;

        progress.run.status = status;
        progress.counts = counts;
        Ok(())
    }

    /// Stores a document instance at a node under an inspector tab.
    pub fn insert_node_document(
        &self,
        node_id: NodeId,
        tab: InspectorTab,
        mut instance: DocumentInstance,
    ) {
        instance.node_id = Some(node_id);
        self.state()
            .node_documents
            .entry((node_id, tab))
            .or_default()
            .push(instance);
    }

    /// Stores an orphaned document instance.
    pub fn insert_orphaned_document(&self, workflow_id: WorkflowId, mut instance: DocumentInstance) {
        instance.node_id = None;
        self.state()
            .orphaned
            .entry(workflow_id)
            .or_default()
            .push(instance);
    }

    /// Replaces the per-node summary of a workflow.
    pub fn set_node_summary(&self, workflow_id: WorkflowId, summary: Vec<NodeSummary>) {
        self.state().summaries.insert(workflow_id, summary);
    }

    /// Returns every upload received so far.
    pub fn uploads(&self) -> Vec<UploadDocument> {
        self.state().uploads.clone()
    }

    /// Returns every run request received so far.
    pub fn run_requests(&self) -> Vec<CreateRun> {
        self.state().run_requests.clone()
    }

    /// Returns every re-trigger request received so far.
    pub fn retriggers(&self) -> Vec<Retrigger> {
        self.state().retriggers.clone()
    }

    /// Makes every call of `operation` fail with `kind` until recovered.
    pub fn fail(&self, operation: MockOperation, kind: ErrorKind) {
        self.state().fail(operation, kind, None);
    }

    /// Makes the next call of `operation` fail with `kind`.
    pub fn fail_once(&self, operation: MockOperation, kind: ErrorKind) {
        self.state().fail(operation, kind, Some(1));
    }

    /// Removes an injected failure.
    pub fn recover(&self, operation: MockOperation) {
        self.state().recover(operation);
    }

    /// Returns how many times `operation` was called.
    pub fn calls(&self, operation: MockOperation) -> usize {
        self.state().calls(operation)
    }
}

#[async_trait::async_trait]
impl FlowProvider for MockFlowProvider {
    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.enter(MockOperation::ListWorkflows).await?;
        Ok(self.state().workflows.values().cloned().collect())
    }

    async fn get_workflow(&self, workflow_id: WorkflowId) -> Result<Workflow> {
        self.enter(MockOperation::GetWorkflow).await?;
        self.state().workflow(workflow_id).cloned()
    }

    async fn create_workflow(&self, request: &CreateWorkflow) -> Result<Workflow> {
        self.enter(MockOperation::CreateWorkflow).await?;
        Ok(self.insert_workflow(request.name.clone()))
    }

    async fn update_workflow(
        &self,
        workflow_id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> Result<Workflow> {
        self.enter(MockOperation::UpdateWorkflow).await?;

        let mut state = self.state();
        let workflow = state
            .workflows
            .get_mut(&workflow_id)
            .ok_or_else(|| Error::not_found().with_message(format!("workflow {workflow_id}")))?;

        if let Some(name) = &request.name {
            workflow.name = name.clone();
        }
        if let Some(published) = request.published {
            workflow.published = published;
        }

        Ok(workflow.clone())
    }

    async fn delete_workflow(&self, workflow_id: WorkflowId) -> Result<()> {
        self.enter(MockOperation::DeleteWorkflow).await?;

        let mut state = self.state();
        state.workflow(workflow_id)?;
        state.workflows.remove(&workflow_id);
        state.nodes.remove(&workflow_id);
        state.edges.remove(&workflow_id);
        Ok(())
    }

    async fn list_nodes(&self, workflow_id: WorkflowId) -> Result<Vec<Node>> {
        self.enter(MockOperation::ListNodes).await?;
        Ok(self.state().nodes_mut(workflow_id)?.clone())
    }

    async fn create_node(&self, workflow_id: WorkflowId, request: &CreateNode) -> Result<Node> {
        self.enter(MockOperation::CreateNode).await?;

        let node = Node::new(
            NodeId::new(),
            request.kind,
            request.name.clone(),
            request.position(),
        );
        self.state().nodes_mut(workflow_id)?.push(node.clone());
        Ok(node)
    }

    async fn update_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        request: &UpdateNode,
    ) -> Result<Node> {
        self.enter(MockOperation::UpdateNode).await?;

        let mut state = self.state();
        let node = state
            .nodes_mut(workflow_id)?
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| Error::not_found().with_message(format!("node {node_id}")))?;

        if let Some(config) = &request.config {
            node.config = NodeConfig::from_value(node.kind(), config.clone())
                .map_err(|e| Error::invalid_input().with_message(e.to_string()))?;
        }
        if let Some(name) = &request.name {
            node.name = name.clone();
        }
        if let (Some(x), Some(y)) = (request.x, request.y) {
            node.position = Position::new(x, y);
        }

        Ok(node.clone())
    }

    async fn delete_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        force: bool,
    ) -> Result<NodeDeletion> {
        self.enter(MockOperation::DeleteNode).await?;

        let mut state = self.state();
        if !state.has_node(workflow_id, node_id) {
            return Err(Error::not_found().with_message(format!("node {node_id}")));
        }

        if let Some(conflict) = state.held.get(&node_id).copied()
            && !force
        {
            return Ok(NodeDeletion::Conflict(conflict));
        }

        state.held.remove(&node_id);
        state.nodes_mut(workflow_id)?.retain(|n| n.id != node_id);
        state.edges_mut(workflow_id)?.retain(|e| !e.touches(node_id));

        // Held documents move to the orphaned area; everything else is dropped.
        let held = state
            .node_documents
            .remove(&(node_id, InspectorTab::Held))
            .unwrap_or_default();
        state.node_documents.retain(|(node, _), _| *node != node_id);
        state
            .orphaned
            .entry(workflow_id)
            .or_default()
            .extend(held.into_iter().map(|mut doc| {
                doc.node_id = None;
                doc
            }));

        Ok(NodeDeletion::Deleted)
    }

    async fn list_edges(&self, workflow_id: WorkflowId) -> Result<Vec<Edge>> {
        self.enter(MockOperation::ListEdges).await?;
        Ok(self.state().edges_mut(workflow_id)?.clone())
    }

    async fn create_edge(&self, workflow_id: WorkflowId, request: &CreateEdge) -> Result<Edge> {
        self.enter(MockOperation::CreateEdge).await?;

        let mut state = self.state();
        for node_id in [request.source_node_id, request.target_node_id] {
            if !state.has_node(workflow_id, node_id) {
                return Err(Error::invalid_input().with_message(format!("unknown node {node_id}")));
            }
        }

        let edge = Edge {
            id: EdgeId::new(),
            source_node_id: request.source_node_id,
            source_port: request.source_port.clone(),
            target_node_id: request.target_node_id,
            target_port: request.target_port.clone(),
        };
        state.edges_mut(workflow_id)?.push(edge.clone());
        Ok(edge)
    }

    async fn delete_edge(&self, workflow_id: WorkflowId, edge_id: EdgeId) -> Result<()> {
        self.enter(MockOperation::DeleteEdge).await?;

        let mut state = self.state();
        let edges = state.edges_mut(workflow_id)?;
        let before = edges.len();
        edges.retain(|e| e.id != edge_id);

        if edges.len() == before {
            return Err(Error::not_found().with_message(format!("edge {edge_id}")));
        }
        Ok(())
    }

    async fn upload_document(
        &self,
        workflow_id: WorkflowId,
        request: UploadDocument,
    ) -> Result<UploadedDocument> {
        self.enter(MockOperation::UploadDocument).await?;

        let mut state = self.state();
        state.workflow(workflow_id)?;
        state.uploads.push(request);
        Ok(UploadedDocument {
            id: DocumentId::new(),
        })
    }

    async fn create_run(&self, workflow_id: WorkflowId, request: &CreateRun) -> Result<Run> {
        self.enter(MockOperation::CreateRun).await?;

        let mut state = self.state();
        state.workflow(workflow_id)?;

        let run = Run {
            id: RunId::new(),
            workflow_id,
            status: state.initial_run_status,
            created_at: None,
            completed_at: None,
        };

        state.run_requests.push(request.clone());
        state.latest_run = Some(run.id);
        state.runs.insert(
            run.id,
            RunProgress {
                run: run.clone(),
                counts: Vec::new(),
            },
        );
        Ok(run)
    }

    async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.enter(MockOperation::GetRun).await?;
        self.state()
            .runs
            .get(&run_id)
            .map(|progress| progress.run.clone())
            .ok_or_else(|| Error::not_found().with_message(format!("run {run_id}")))
    }

    async fn get_run_node_counts(&self, run_id: RunId) -> Result<Vec<NodeStatusCount>> {
        self.enter(MockOperation::GetRunNodeCounts).await?;
        self.state()
            .runs
            .get(&run_id)
            .map(|progress| progress.counts.clone())
            .ok_or_else(|| Error::not_found().with_message(format!("run {run_id}")))
    }

    async fn get_node_summary(&self, workflow_id: WorkflowId) -> Result<Vec<NodeSummary>> {
        self.enter(MockOperation::GetNodeSummary).await?;
        Ok(self
            .state()
            .summaries
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_node_documents(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        tab: InspectorTab,
    ) -> Result<Vec<DocumentInstance>> {
        self.enter(MockOperation::ListNodeDocuments).await?;

        let state = self.state();
        if !state.has_node(workflow_id, node_id) {
            return Err(Error::not_found().with_message(format!("node {node_id}")));
        }

        Ok(state
            .node_documents
            .get(&(node_id, tab))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_orphaned_documents(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<DocumentInstance>> {
        self.enter(MockOperation::ListOrphanedDocuments).await?;
        Ok(self
            .state()
            .orphaned
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_document(
        &self,
        workflow_id: WorkflowId,
        instance_id: InstanceId,
    ) -> Result<()> {
        self.enter(MockOperation::DeleteDocument).await?;

        let removed = self
            .state()
            .remove_documents(workflow_id, |doc| doc.id == instance_id);
        if removed == 0 {
            return Err(Error::not_found().with_message(format!("document {instance_id}")));
        }
        Ok(())
    }

    async fn retrigger(&self, workflow_id: WorkflowId, request: &Retrigger) -> Result<()> {
        self.enter(MockOperation::Retrigger).await?;

        let mut state = self.state();
        let nodes = state.nodes_mut(workflow_id)?;
        for trigger_id in &request.trigger_node_ids {
            let is_trigger = nodes
                .iter()
                .any(|n| n.id == *trigger_id && n.is_trigger());
            if !is_trigger {
                return Err(
                    Error::invalid_input().with_message(format!("{trigger_id} is not a trigger"))
                );
            }
        }

        state.remove_documents(workflow_id, |doc| request.instance_ids.contains(&doc.id));
        state.retriggers.push(request.clone());
        Ok(())
    }
}
