//! Shared state behind the mock provider.

use std::collections::{BTreeMap, HashMap};

use flowdesk_core::graph::{Edge, Node, Workflow};
use flowdesk_core::id::{NodeId, RunId, WorkflowId};
use flowdesk_core::provider::{CreateRun, DeletionConflict, Retrigger, UploadDocument};
use flowdesk_core::run::{
    DocumentInstance, InspectorTab, NodeStatusCount, NodeSummary, Run, RunStatus,
};
use flowdesk_core::{Error, ErrorKind, Result};

use super::MockOperation;
use crate::TRACING_TARGET;

/// An injected failure.
#[derive(Debug, Clone, Copy)]
struct Failure {
    kind: ErrorKind,
    /// Remaining failing calls; `None` fails until recovered.
    remaining: Option<usize>,
}

/// Stored progress of a run.
#[derive(Debug, Clone)]
pub(super) struct RunProgress {
    pub run: Run,
    pub counts: Vec<NodeStatusCount>,
}

#[derive(Debug)]
pub(super) struct MockState {
    pub workflows: BTreeMap<WorkflowId, Workflow>,
    pub nodes: BTreeMap<WorkflowId, Vec<Node>>,
    pub edges: BTreeMap<WorkflowId, Vec<Edge>>,
    pub held: HashMap<NodeId, DeletionConflict>,
    pub runs: HashMap<RunId, RunProgress>,
    pub latest_run: Option<RunId>,
    pub initial_run_status: RunStatus,
    pub node_documents: HashMap<(NodeId, InspectorTab), Vec<DocumentInstance>>,
    pub orphaned: BTreeMap<WorkflowId, Vec<DocumentInstance>>,
    pub summaries: BTreeMap<WorkflowId, Vec<NodeSummary>>,
    pub uploads: Vec<UploadDocument>,
    pub run_requests: Vec<CreateRun>,
    pub retriggers: Vec<Retrigger>,
    failures: HashMap<MockOperation, Failure>,
    calls: HashMap<MockOperation, usize>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            workflows: BTreeMap::new(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            held: HashMap::new(),
            runs: HashMap::new(),
            latest_run: None,
            initial_run_status: RunStatus::Running,
            node_documents: HashMap::new(),
            orphaned: BTreeMap::new(),
            summaries: BTreeMap::new(),
            uploads: Vec::new(),
            run_requests: Vec::new(),
            retriggers: Vec::new(),
            failures: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

impl MockState {
    /// Records a call and applies any injected failure.
    pub fn enter(&mut self, operation: MockOperation) -> Result<()> {
        *self.calls.entry(operation).or_default() += 1;

        let Some(failure) = self.failures.get_mut(&operation) else {
            return Ok(());
        };

        let kind = failure.kind;
        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(&operation);
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            operation = %operation,
            kind = %kind,
            "Injected failure"
        );

        Err(Error::new(kind).with_message(format!("injected failure for {operation}")))
    }

    pub fn fail(&mut self, operation: MockOperation, kind: ErrorKind, times: Option<usize>) {
        if times == Some(0) {
            return;
        }

        self.failures.insert(
            operation,
            Failure {
                kind,
                remaining: times,
            },
        );
    }

    pub fn recover(&mut self, operation: MockOperation) {
        self.failures.remove(&operation);
    }

    pub fn calls(&self, operation: MockOperation) -> usize {
        self.calls.get(&operation).copied().unwrap_or_default()
    }

    pub fn workflow(&self, workflow_id: WorkflowId) -> Result<&Workflow> {
        self.workflows
            .get(&workflow_id)
            .ok_or_else(|| Error::not_found().with_message(format!("workflow {workflow_id}")))
    }

    pub fn nodes_mut(&mut self, workflow_id: WorkflowId) -> Result<&mut Vec<Node>> {
        self.workflow(workflow_id)?;
        Ok(self.nodes.entry(workflow_id).or_default())
    }

    pub fn edges_mut(&mut self, workflow_id: WorkflowId) -> Result<&mut Vec<Edge>> {
        self.workflow(workflow_id)?;
        Ok(self.edges.entry(workflow_id).or_default())
    }

    pub fn has_node(&self, workflow_id: WorkflowId, node_id: NodeId) -> bool {
        self.nodes
            .get(&workflow_id)
            .is_some_and(|nodes| nodes.iter().any(|n| n.id == node_id))
    }

    /// Removes document instances by id from every inspector list.
    ///
    /// Returns the number of removed instances.
    pub fn remove_documents(
        &mut self,
        workflow_id: WorkflowId,
        matches: impl Fn(&DocumentInstance) -> bool,
    ) -> usize {
        let mut removed = 0;

        for list in self.node_documents.values_mut() {
            let before = list.len();
            list.retain(|doc| !matches(doc));
            removed += before - list.len();
        }

        if let Some(list) = self.orphaned.get_mut(&workflow_id) {
            let before = list.len();
            list.retain(|doc| !matches(doc));
            removed += before - list.len();
        }

        removed
    }
}
