//! Workflow-wide per-node document counts.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use flowdesk_core::FlowService;
use flowdesk_core::id::{NodeId, WorkflowId};
use flowdesk_core::run::NodeSummary;
use tokio::sync::watch;

use super::TRACING_TARGET;
use crate::poll::{PollHandle, PollerConfig, spawn_periodic};

/// Latest node summaries of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummarySnapshot {
    /// Summaries keyed by node.
    pub summaries: HashMap<NodeId, NodeSummary>,
    /// Whether at least one response arrived.
    pub loaded: bool,
}

/// Polls the per-node document summary of one workflow.
pub struct NodeSummaryPoller {
    service: FlowService,
    workflow_id: WorkflowId,
    config: PollerConfig,
    state: Arc<watch::Sender<SummarySnapshot>>,
    handle: Option<PollHandle>,
}

impl std::fmt::Debug for NodeSummaryPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSummaryPoller")
            .field("workflow_id", &self.workflow_id)
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

impl NodeSummaryPoller {
    /// Creates a stopped poller.
    pub fn new(service: FlowService, workflow_id: WorkflowId, config: PollerConfig) -> Self {
        Self {
            service,
            workflow_id,
            config,
            state: Arc::new(watch::Sender::new(SummarySnapshot::default())),
            handle: None,
        }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> SummarySnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.state.subscribe()
    }

    /// Returns the latest summary of one node.
    pub fn summary(&self, node_id: NodeId) -> Option<NodeSummary> {
        self.state.borrow().summaries.get(&node_id).cloned()
    }

    /// Returns whether a poll is running.
    pub fn is_polling(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Starts polling, restarting any poll already running.
    pub fn start(&mut self) {
        self.stop();

        let service = self.service.clone();
        let state = self.state.clone();
        let workflow_id = self.workflow_id;
        self.handle = Some(spawn_periodic("node_summary", self.config.interval, move || {
            let service = service.clone();
            let state = state.clone();
            async move {
                poll_summary(&service, &state, workflow_id).await;
                ControlFlow::Continue(())
            }
        }));
    }

    /// Stops polling. The last snapshot stays published.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

async fn poll_summary(
    service: &FlowService,
    state: &watch::Sender<SummarySnapshot>,
    workflow_id: WorkflowId,
) {
    match service.get_node_summary(workflow_id).await {
        Ok(summaries) => {
            state.send_replace(SummarySnapshot {
                summaries: summaries.into_iter().map(|s| (s.node_id, s)).collect(),
                loaded: true,
            });
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                workflow_id = %workflow_id,
                error = %error,
                "Node summary poll failed, retrying on next tick"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flowdesk_core::ErrorKind;
    use flowdesk_core::run::DocumentStatus;
    use flowdesk_test::{MockFlowProvider, MockOperation};

    use super::*;

    fn summary(node_id: NodeId, held: u32) -> NodeSummary {
        NodeSummary {
            node_id,
            held,
            ..NodeSummary::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_summaries_replace_on_each_tick() {
        let mock = MockFlowProvider::default();
        let workflow_id = mock.insert_workflow("Invoices").id;
        let (a, b) = (NodeId::new(), NodeId::new());
        mock.set_node_summary(workflow_id, vec![summary(a, 3)]);

        let mut poller =
            NodeSummaryPoller::new(FlowService::new(mock.clone()), workflow_id, PollerConfig::default());
        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(poller.snapshot().loaded);
        assert_eq!(poller.summary(a).map(|s| s.count(DocumentStatus::Held)), Some(3));

        mock.set_node_summary(workflow_id, vec![summary(b, 1)]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(poller.summary(a).is_none());
        assert_eq!(poller.summary(b).map(|s| s.held), Some(1));
        poller.stop();
        assert!(!poller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_last_summary() {
        let mock = MockFlowProvider::default();
        let workflow_id = mock.insert_workflow("Invoices").id;
        let node_id = NodeId::new();
        mock.set_node_summary(workflow_id, vec![summary(node_id, 2)]);

        let mut poller =
            NodeSummaryPoller::new(FlowService::new(mock.clone()), workflow_id, PollerConfig::default());
        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        mock.fail_once(MockOperation::GetNodeSummary, ErrorKind::Timeout);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(poller.is_polling());
        assert_eq!(poller.summary(node_id).map(|s| s.held), Some(2));
    }
}
