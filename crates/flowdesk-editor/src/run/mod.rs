//! Run triggering and live status polling.
//!
//! [`RunStatusPoller`] uploads documents, starts a run and polls its status
//! and per-node document counts until the run finishes. Every successful
//! poll replaces the published [`RunSnapshot`] wholesale; failed polls are
//! logged and retried on the next tick.

mod overlay;

use std::ops::ControlFlow;
use std::sync::Arc;

use flowdesk_core::id::{NodeId, RunId, WorkflowId};
use flowdesk_core::provider::{CreateRun, RunDocumentGroup, UploadDocument};
use flowdesk_core::run::{Run, RunStatus};
use flowdesk_core::{Error, FlowService, Result};
pub use overlay::RunOverlay;
use strum::{AsRefStr, Display};
use tokio::sync::watch;

use crate::poll::{PollHandle, PollerConfig, spawn_periodic};
use crate::store::GraphState;

/// Tracing target for run status polling.
const TRACING_TARGET: &str = "flowdesk_editor::run";

/// Lifecycle of the run status poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    /// No run is being observed.
    #[default]
    Idle,
    /// A run is queued or executing and being polled.
    Running,
    /// The run completed.
    Completed,
    /// The run failed or was cancelled.
    Failed,
}

impl RunPhase {
    /// Maps a remote run status onto a phase.
    pub const fn from_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued | RunStatus::Running => Self::Running,
            RunStatus::Completed => Self::Completed,
            RunStatus::Failed | RunStatus::Cancelled => Self::Failed,
        }
    }

    /// Returns whether the run has finished.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Published state of the run status poller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSnapshot {
    /// Current phase.
    pub phase: RunPhase,
    /// Latest known state of the observed run.
    pub run: Option<Run>,
    /// Latest overlay.
    pub overlay: RunOverlay,
}

impl RunSnapshot {
    fn observes(&self, run_id: RunId) -> bool {
        self.run.as_ref().is_some_and(|run| run.id == run_id)
    }
}

/// Documents injected at one trigger node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet {
    /// Trigger node; `None` for workflows without trigger nodes.
    pub trigger_node_id: Option<NodeId>,
    /// Files to upload.
    pub documents: Vec<UploadDocument>,
}

impl DocumentSet {
    /// Creates a set for a workflow without trigger nodes.
    pub fn unscoped(documents: Vec<UploadDocument>) -> Self {
        Self {
            trigger_node_id: None,
            documents,
        }
    }

    /// Creates a set destined for one trigger node.
    pub fn for_trigger(trigger_node_id: NodeId, documents: Vec<UploadDocument>) -> Self {
        Self {
            trigger_node_id: Some(trigger_node_id),
            documents,
        }
    }

    /// Routes documents to a trigger node of the loaded graph.
    ///
    /// An explicit `trigger` must name a trigger node. Without one, the
    /// documents go to the only trigger node, or stay unscoped when the
    /// workflow has none. A workflow with several trigger nodes needs an
    /// explicit choice.
    pub fn route(
        state: &GraphState,
        trigger: Option<NodeId>,
        documents: Vec<UploadDocument>,
    ) -> Result<Self> {
        if let Some(node_id) = trigger {
            return match state.node(node_id) {
                Some(node) if node.is_trigger() => Ok(Self::for_trigger(node_id, documents)),
                Some(node) => Err(Error::invalid_input()
                    .with_message(format!("node `{}` is not a trigger", node.name))),
                None => Err(Error::not_found().with_message(format!("node {node_id}"))),
            };
        }

        let triggers: Vec<_> = state.trigger_nodes().map(|n| n.id).collect();
        match triggers.as_slice() {
            [] => Ok(Self::unscoped(documents)),
            [only] => Ok(Self::for_trigger(*only, documents)),
            many => Err(Error::invalid_input().with_message(format!(
                "workflow has {} trigger nodes; choose one",
                many.len()
            ))),
        }
    }
}

/// Triggers runs and polls their progress into a [`RunSnapshot`].
pub struct RunStatusPoller {
    service: FlowService,
    config: PollerConfig,
    state: Arc<watch::Sender<RunSnapshot>>,
    handle: Option<PollHandle>,
}

impl std::fmt::Debug for RunStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStatusPoller")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl RunStatusPoller {
    /// Creates an idle poller.
    pub fn new(service: FlowService, config: PollerConfig) -> Self {
        Self {
            service,
            config,
            state: Arc::new(watch::Sender::new(RunSnapshot::default())),
            handle: None,
        }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshots.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.state.subscribe()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> RunPhase {
        self.state.borrow().phase
    }

    /// Returns whether a run is currently being polled.
    pub fn is_polling(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Uploads the documents, starts a run and begins polling it.
    ///
    /// Any run already being polled stops being observed first. Upload and
    /// run creation failures are returned and leave the poller idle.
    pub async fn trigger(&mut self, workflow_id: WorkflowId, sets: Vec<DocumentSet>) -> Result<Run> {
        self.stop();
        self.state.send_replace(RunSnapshot::default());

        let mut groups = Vec::with_capacity(sets.len());
        for set in sets.into_iter().filter(|set| !set.documents.is_empty()) {
            let mut document_ids = Vec::with_capacity(set.documents.len());
            for document in set.documents {
                let document = match set.trigger_node_id {
                    Some(node_id) => document.for_trigger(node_id),
                    None => document,
                };
                let uploaded = self.service.upload_document(workflow_id, document).await?;
                document_ids.push(uploaded.id);
            }

            groups.push(RunDocumentGroup {
                trigger_node_id: set.trigger_node_id,
                document_ids,
            });
        }

        let run = self
            .service
            .create_run(workflow_id, &CreateRun { documents: groups })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            run_id = %run.id,
            "Polling run status"
        );

        self.state.send_replace(RunSnapshot {
            phase: RunPhase::Running,
            run: Some(run.clone()),
            overlay: RunOverlay::default(),
        });
        self.handle = Some(self.spawn_poller(run.id));
        Ok(run)
    }

    /// Stops polling. The last snapshot stays published.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }

    fn spawn_poller(&self, run_id: RunId) -> PollHandle {
        let service = self.service.clone();
        let state = self.state.clone();

        spawn_periodic("run_status", self.config.interval, move || {
            let service = service.clone();
            let state = state.clone();
            async move { poll_run(&service, &state, run_id).await }
        })
    }
}

async fn poll_run(
    service: &FlowService,
    state: &watch::Sender<RunSnapshot>,
    run_id: RunId,
) -> ControlFlow<()> {
    let result = tokio::try_join!(service.get_run(run_id), service.get_run_node_counts(run_id));
    let (run, counts) = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                run_id = %run_id,
                error = %error,
                "Run status poll failed, retrying on next tick"
            );
            return ControlFlow::Continue(());
        }
    };

    let phase = RunPhase::from_status(run.status);
    let overlay = RunOverlay::from_samples(counts);

    let published = state.send_if_modified(|snapshot| {
        if !snapshot.observes(run_id) {
            return false;
        }

        *snapshot = RunSnapshot {
            phase,
            run: Some(run),
            overlay,
        };
        true
    });

    if !published {
        return ControlFlow::Break(());
    }

    if phase.is_terminal() {
        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run_id,
            phase = %phase,
            "Run finished"
        );
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flowdesk_core::ErrorKind;
    use flowdesk_core::graph::{Node, NodeKind, Position};
    use flowdesk_core::run::{DocumentStatus, NodeStatusCount};
    use flowdesk_test::{MockFlowProvider, MockOperation};

    use super::*;

    const TICK: Duration = Duration::from_secs(2);

    fn setup() -> (MockFlowProvider, RunStatusPoller, WorkflowId) {
        let mock = MockFlowProvider::default();
        let workflow = mock.insert_workflow("Invoices");
        let poller = RunStatusPoller::new(FlowService::new(mock.clone()), PollerConfig::default());
        (mock, poller, workflow.id)
    }

    fn documents(n: usize) -> Vec<UploadDocument> {
        (0..n)
            .map(|i| UploadDocument::new(format!("doc-{i}.pdf"), vec![0u8; 4]))
            .collect()
    }

    /// Lets the first tick run.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_uploads_per_trigger_node() {
        let (mock, mut poller, workflow_id) = setup();
        let (a, b) = (NodeId::new(), NodeId::new());

        poller
            .trigger(
                workflow_id,
                vec![
                    DocumentSet::for_trigger(a, documents(2)),
                    DocumentSet::for_trigger(b, documents(1)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(poller.phase(), RunPhase::Running);
        let uploads = mock.uploads();
        assert_eq!(uploads.len(), 3);
        assert_eq!(uploads[0].trigger_node_id, Some(a));
        assert_eq!(uploads[2].trigger_node_id, Some(b));

        let request = &mock.run_requests()[0];
        assert_eq!(request.documents.len(), 2);
        assert_eq!(request.documents[0].document_ids.len(), 2);
        assert_eq!(request.documents[1].trigger_node_id, Some(b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_failure_leaves_poller_idle() {
        let (mock, mut poller, workflow_id) = setup();
        mock.fail_once(MockOperation::UploadDocument, ErrorKind::NetworkError);

        let error = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(poller.phase(), RunPhase::Idle);
        assert!(!poller.is_polling());
        assert_eq!(mock.calls(MockOperation::CreateRun), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_without_documents_starts_run() {
        let (mock, mut poller, workflow_id) = setup();

        let run = poller.trigger(workflow_id, Vec::new()).await.unwrap();
        assert_eq!(run.workflow_id, workflow_id);
        assert_eq!(poller.phase(), RunPhase::Running);
        assert!(poller.is_polling());
        assert_eq!(mock.calls(MockOperation::CreateRun), 1);
        assert!(mock.run_requests()[0].documents.is_empty());

        poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(Vec::new())])
            .await
            .unwrap();
        assert!(mock.uploads().is_empty());
        assert!(mock.run_requests()[1].documents.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_conditional_branches_light_up() {
        let (mock, mut poller, workflow_id) = setup();
        let upload = mock.insert_node(
            workflow_id,
            Node::new(NodeId::new(), NodeKind::ManualUpload, "Upload", Position::default()),
        );
        let branch = mock.insert_node(
            workflow_id,
            Node::new(NodeId::new(), NodeKind::ConditionalIf, "Check", Position::new(300.0, 0.0)),
        );
        mock.insert_edge(workflow_id, upload.id, "default", branch.id, "default");

        let run = poller
            .trigger(workflow_id, vec![DocumentSet::for_trigger(upload.id, documents(2))])
            .await
            .unwrap();

        mock.set_run_progress(
            run.id,
            RunStatus::Running,
            vec![NodeStatusCount::new(branch.id, DocumentStatus::Processing, 2)],
        )
        .unwrap();
        settle().await;
        assert_eq!(
            poller.snapshot().overlay.dominant_status(branch.id),
            Some(DocumentStatus::Processing)
        );

        mock.set_run_progress(
            run.id,
            RunStatus::Running,
            vec![
                NodeStatusCount::new(branch.id, DocumentStatus::Completed, 1).with_output_port("true"),
                NodeStatusCount::new(branch.id, DocumentStatus::Completed, 1).with_output_port("false"),
            ],
        )
        .unwrap();
        tokio::time::sleep(TICK).await;

        let overlay = poller.snapshot().overlay;
        assert_eq!(overlay.dominant_status(branch.id), Some(DocumentStatus::Completed));
        assert!(overlay.is_port_active(branch.id, "true"));
        assert!(overlay.is_port_active(branch.id, "false"));
        assert_eq!(overlay.count(branch.id, DocumentStatus::Processing), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_tick_replaces_overlay() {
        let (mock, mut poller, workflow_id) = setup();
        let run = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap();
        let (a, b) = (NodeId::new(), NodeId::new());

        mock.set_run_progress(
            run.id,
            RunStatus::Running,
            vec![NodeStatusCount::new(a, DocumentStatus::Processing, 1)],
        )
        .unwrap();
        settle().await;
        assert_eq!(
            poller.snapshot().overlay.dominant_status(a),
            Some(DocumentStatus::Processing)
        );

        mock.set_run_progress(
            run.id,
            RunStatus::Running,
            vec![NodeStatusCount::new(b, DocumentStatus::Held, 1)],
        )
        .unwrap();
        tokio::time::sleep(TICK).await;

        let overlay = poller.snapshot().overlay;
        assert!(overlay.samples(a).is_empty());
        assert_eq!(overlay.nodes().collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_when_run_finishes() {
        let (mock, mut poller, workflow_id) = setup();
        let run = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap();

        mock.set_run_progress(run.id, RunStatus::Cancelled, Vec::new())
            .unwrap();
        settle().await;
        assert_eq!(poller.phase(), RunPhase::Failed);

        let calls = mock.calls(MockOperation::GetRun);
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(mock.calls(MockOperation::GetRun), calls);
        assert!(!poller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_are_retried() {
        let (mock, mut poller, workflow_id) = setup();
        mock.fail_once(MockOperation::GetRunNodeCounts, ErrorKind::ServiceUnavailable);

        let run = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap();
        settle().await;
        assert_eq!(poller.phase(), RunPhase::Running);

        mock.set_run_progress(run.id, RunStatus::Completed, Vec::new())
            .unwrap();
        tokio::time::sleep(TICK).await;
        assert_eq!(poller.phase(), RunPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_stops_previous_poller() {
        let (mock, mut poller, workflow_id) = setup();
        let first = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap();
        settle().await;

        let second = poller
            .trigger(workflow_id, vec![DocumentSet::unscoped(documents(1))])
            .await
            .unwrap();
        mock.set_run_progress(first.id, RunStatus::Failed, Vec::new())
            .unwrap();
        tokio::time::sleep(TICK * 2).await;

        let snapshot = poller.snapshot();
        assert_eq!(snapshot.run.unwrap().id, second.id);
        assert_eq!(snapshot.phase, RunPhase::Running);
    }

    #[test]
    fn test_route_documents() {
        let upload = Node::new(NodeId::new(), NodeKind::ManualUpload, "Upload", Position::default());
        let hook = Node::new(NodeId::new(), NodeKind::Webhook, "Hook", Position::default());
        let extract = Node::new(NodeId::new(), NodeKind::Extractor, "Extract", Position::default());

        let mut state = GraphState {
            workflow: None,
            nodes: vec![extract.clone()],
            edges: Vec::new(),
        };
        let set = DocumentSet::route(&state, None, documents(1)).unwrap();
        assert_eq!(set.trigger_node_id, None);

        state.nodes.push(upload.clone());
        let set = DocumentSet::route(&state, None, documents(1)).unwrap();
        assert_eq!(set.trigger_node_id, Some(upload.id));

        state.nodes.push(hook.clone());
        assert!(DocumentSet::route(&state, None, documents(1)).is_err());
        let set = DocumentSet::route(&state, Some(hook.id), documents(1)).unwrap();
        assert_eq!(set.trigger_node_id, Some(hook.id));

        let error = DocumentSet::route(&state, Some(extract.id), documents(1)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }
}
