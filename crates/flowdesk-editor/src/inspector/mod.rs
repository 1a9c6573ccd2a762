//! Per-node and orphaned document inspectors.
//!
//! A [`NodeInspector`] polls the documents of one [`InspectorScope`] and
//! publishes each response as a new [`InspectorSnapshot`]. Opening another
//! scope stops the previous poll before the next one starts, so responses
//! for a scope the user already left are never shown.

mod scope;
mod summary;

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use flowdesk_core::id::{InstanceId, NodeId, WorkflowId};
use flowdesk_core::provider::Retrigger;
use flowdesk_core::run::DocumentInstance;
use flowdesk_core::{Error, FlowService, Result};
pub use scope::{InspectorScope, available_tabs};
pub use summary::{NodeSummaryPoller, SummarySnapshot};
use tokio::sync::watch;

use crate::poll::{PollHandle, PollerConfig, spawn_periodic};

/// Tracing target for inspector polling.
const TRACING_TARGET: &str = "flowdesk_editor::inspector";

/// Documents currently shown by an inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectorSnapshot {
    /// Open scope; `None` when the inspector is closed.
    pub scope: Option<InspectorScope>,
    /// Rows of the latest response.
    pub documents: Vec<DocumentInstance>,
    /// Whether at least one response arrived for the open scope.
    pub loaded: bool,
    generation: u64,
}

impl InspectorSnapshot {
    /// Returns the row with the given instance id.
    pub fn document(&self, instance_id: InstanceId) -> Option<&DocumentInstance> {
        self.documents.iter().find(|d| d.id == instance_id)
    }
}

/// Polls the documents of one inspector scope at a time.
pub struct NodeInspector {
    service: FlowService,
    workflow_id: WorkflowId,
    config: PollerConfig,
    state: Arc<watch::Sender<InspectorSnapshot>>,
    handle: Option<PollHandle>,
}

impl std::fmt::Debug for NodeInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInspector")
            .field("workflow_id", &self.workflow_id)
            .field("scope", &self.scope())
            .finish_non_exhaustive()
    }
}

impl NodeInspector {
    /// Creates a closed inspector for a workflow.
    pub fn new(service: FlowService, workflow_id: WorkflowId, config: PollerConfig) -> Self {
        Self {
            service,
            workflow_id,
            config,
            state: Arc::new(watch::Sender::new(InspectorSnapshot::default())),
            handle: None,
        }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> InspectorSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshots.
    pub fn subscribe(&self) -> watch::Receiver<InspectorSnapshot> {
        self.state.subscribe()
    }

    /// Returns the open scope.
    pub fn scope(&self) -> Option<InspectorScope> {
        self.state.borrow().scope
    }

    /// Returns whether a poll is running.
    pub fn is_polling(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Opens a scope and starts polling it.
    ///
    /// Any previously open scope stops polling first and its rows are
    /// cleared.
    pub fn open(&mut self, scope: InspectorScope) {
        self.stop_poll();

        let generation = self.state.borrow().generation.wrapping_add(1);
        self.state.send_replace(InspectorSnapshot {
            scope: Some(scope),
            documents: Vec::new(),
            loaded: false,
            generation,
        });

        tracing::debug!(
            target: TRACING_TARGET,
            workflow_id = %self.workflow_id,
            scope = ?scope,
            "Opening inspector"
        );

        let service = self.service.clone();
        let state = self.state.clone();
        let workflow_id = self.workflow_id;
        self.handle = Some(spawn_periodic("inspector", self.config.interval, move || {
            let service = service.clone();
            let state = state.clone();
            async move { poll_scope(&service, &state, workflow_id, scope, generation).await }
        }));
    }

    /// Stops polling and clears the snapshot.
    pub fn close(&mut self) {
        self.stop_poll();

        let generation = self.state.borrow().generation.wrapping_add(1);
        self.state.send_replace(InspectorSnapshot {
            generation,
            ..InspectorSnapshot::default()
        });
    }

    /// Deletes one document instance and removes its row.
    pub async fn delete_document(&self, instance_id: InstanceId) -> Result<()> {
        self.service
            .delete_document(self.workflow_id, instance_id)
            .await?;

        self.remove_rows(&HashSet::from([instance_id]));
        Ok(())
    }

    /// Sends instances back into the workflow at the given trigger nodes and
    /// removes their rows.
    pub async fn retrigger(
        &self,
        instance_ids: Vec<InstanceId>,
        trigger_node_ids: Vec<NodeId>,
    ) -> Result<()> {
        if instance_ids.is_empty() {
            return Err(Error::invalid_input().with_message("no documents selected"));
        }
        if trigger_node_ids.is_empty() {
            return Err(Error::invalid_input().with_message("no trigger node selected"));
        }

        let request = Retrigger::new(instance_ids, trigger_node_ids);
        self.service.retrigger(self.workflow_id, &request).await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %self.workflow_id,
            instances = request.instance_ids.len(),
            triggers = request.trigger_node_ids.len(),
            "Re-triggered documents"
        );

        self.remove_rows(&request.instance_ids.iter().copied().collect());
        Ok(())
    }

    fn remove_rows(&self, instance_ids: &HashSet<InstanceId>) {
        self.state.send_if_modified(|snapshot| {
            let before = snapshot.documents.len();
            snapshot.documents.retain(|d| !instance_ids.contains(&d.id));
            snapshot.documents.len() != before
        });
    }

    fn stop_poll(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

async fn poll_scope(
    service: &FlowService,
    state: &watch::Sender<InspectorSnapshot>,
    workflow_id: WorkflowId,
    scope: InspectorScope,
    generation: u64,
) -> ControlFlow<()> {
    let result = match scope {
        InspectorScope::Node { node_id, tab } => {
            service.list_node_documents(workflow_id, node_id, tab).await
        }
        InspectorScope::Orphaned => service.list_orphaned_documents(workflow_id).await,
    };

    let documents = match result {
        Ok(documents) => documents,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                workflow_id = %workflow_id,
                scope = ?scope,
                error = %error,
                "Inspector poll failed, retrying on next tick"
            );
            return ControlFlow::Continue(());
        }
    };

    let mut current = true;
    state.send_if_modified(|snapshot| {
        if snapshot.generation != generation {
            current = false;
            return false;
        }

        snapshot.documents = documents;
        snapshot.loaded = true;
        true
    });

    if current {
        ControlFlow::Continue(())
    } else {
        ControlFlow::Break(())
    }
}
