//! Run and document status types.
//!
//! These types describe what the remote execution engine reports about a
//! run: the run's own status, per-node document counts, and the individual
//! document instances shown in the inspector.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::graph::DEFAULT_PORT;
use crate::id::{DocumentId, InstanceId, NodeId, RunId, WorkflowId};

/// Execution status of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// Run is waiting to start.
    #[default]
    #[serde(alias = "QUEUED")]
    Queued,
    /// Run is in progress.
    #[serde(alias = "RUNNING")]
    Running,
    /// Run finished successfully.
    #[serde(alias = "COMPLETED")]
    Completed,
    /// Run failed.
    #[serde(alias = "FAILED")]
    Failed,
    /// Run was cancelled.
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl RunStatus {
    /// Returns whether the run is still active (queued or running).
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Returns whether the run has finished (completed, failed, or cancelled).
    #[inline]
    pub const fn is_finished(self) -> bool {
        !self.is_active()
    }
}

/// A workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Run identifier.
    pub id: RunId,
    /// Workflow being executed.
    pub workflow_id: WorkflowId,
    /// Current execution status.
    pub status: RunStatus,
    /// When the run was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// When the run finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

/// Status of a document instance at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
    /// Being processed by the node.
    #[serde(alias = "PROCESSING")]
    Processing,
    /// Paused at the node awaiting manual release.
    #[serde(alias = "HELD")]
    Held,
    /// Processing failed at the node.
    #[serde(alias = "FAILED")]
    Failed,
    /// Processed and passed on.
    #[serde(alias = "COMPLETED")]
    Completed,
    /// Processed but no outgoing edge accepted it.
    #[serde(alias = "UNROUTED")]
    Unrouted,
}

/// One `{node, status, count, outputPort?}` sample of a run's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusCount {
    /// Node the documents are at.
    pub node_id: NodeId,
    /// Status of the documents.
    pub status: DocumentStatus,
    /// Number of documents.
    pub count: u32,
    /// Output port the documents left through, for completed documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,
}

impl NodeStatusCount {
    /// Creates a sample without an output port tag.
    pub fn new(node_id: NodeId, status: DocumentStatus, count: u32) -> Self {
        Self {
            node_id,
            status,
            count,
            output_port: None,
        }
    }

    /// Tags the sample with the output port the documents left through.
    #[must_use]
    pub fn with_output_port(mut self, port: impl Into<String>) -> Self {
        self.output_port = Some(port.into());
        self
    }

    /// Returns the output port tag, treating a missing tag as the unnamed
    /// default port.
    pub fn output_port_or_default(&self) -> &str {
        self.output_port.as_deref().unwrap_or(DEFAULT_PORT)
    }
}

/// Per-status document counts for one node, across all runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    /// Node the counts refer to.
    pub node_id: NodeId,
    /// Documents being processed.
    #[serde(default)]
    pub processing: u32,
    /// Documents held.
    #[serde(default)]
    pub held: u32,
    /// Documents failed.
    #[serde(default)]
    pub failed: u32,
    /// Documents completed.
    #[serde(default)]
    pub completed: u32,
    /// Documents unrouted.
    #[serde(default)]
    pub unrouted: u32,
}

impl NodeSummary {
    /// Returns the count for a single status.
    pub fn count(&self, status: DocumentStatus) -> u32 {
        match status {
            DocumentStatus::Processing => self.processing,
            DocumentStatus::Held => self.held,
            DocumentStatus::Failed => self.failed,
            DocumentStatus::Completed => self.completed,
            DocumentStatus::Unrouted => self.unrouted,
        }
    }
}

/// Tabs of the per-node document inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InspectorTab {
    /// Documents currently being processed.
    #[serde(alias = "PROCESSING")]
    Processing,
    /// Documents held at the node. Only holding node types have this tab.
    #[serde(alias = "HELD")]
    Held,
    /// Documents that failed at the node.
    #[serde(alias = "FAILED")]
    Failed,
}

/// A document instance as listed by the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInstance {
    /// Instance identifier.
    pub id: InstanceId,
    /// Uploaded document this instance was created from.
    pub document_id: DocumentId,
    /// Original file name.
    pub file_name: String,
    /// Node the instance is at; absent for orphaned documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Current status.
    pub status: DocumentStatus,
    /// Failure message, for failed instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_run_status_activity() {
        assert!(RunStatus::Queued.is_active());
        assert!(RunStatus::Running.is_active());
        assert!(RunStatus::Completed.is_finished());
        assert!(RunStatus::Failed.is_finished());
        assert!(RunStatus::Cancelled.is_finished());
    }

    #[test]
    fn test_sample_wire_format() {
        let value = json!({
            "nodeId": Uuid::from_u128(1),
            "status": "completed",
            "count": 1,
            "outputPort": "true"
        });

        let sample: NodeStatusCount = serde_json::from_value(value).unwrap();
        assert_eq!(sample.status, DocumentStatus::Completed);
        assert_eq!(sample.output_port_or_default(), "true");
    }

    #[test]
    fn test_untagged_sample_uses_default_port() {
        let sample = NodeStatusCount::new(NodeId::new(), DocumentStatus::Completed, 3);
        assert_eq!(sample.output_port_or_default(), DEFAULT_PORT);
    }

    #[test]
    fn test_summary_missing_counts_default_to_zero() {
        let value = json!({ "nodeId": Uuid::from_u128(1), "held": 2 });
        let summary: NodeSummary = serde_json::from_value(value).unwrap();

        assert_eq!(summary.count(DocumentStatus::Held), 2);
        assert_eq!(summary.count(DocumentStatus::Processing), 0);
    }

    #[test]
    fn test_inspector_tab_query_form() {
        assert_eq!(InspectorTab::Held.as_ref(), "held");
    }

    #[test]
    fn test_run_status_accepts_both_cases() {
        let run = |status: &str| -> Run {
            let value = json!({
                "id": Uuid::from_u128(1),
                "workflowId": Uuid::from_u128(2),
                "status": status
            });
            serde_json::from_value(value).unwrap()
        };

        assert_eq!(run("RUNNING").status, RunStatus::Running);
        assert_eq!(run("running").status, RunStatus::Running);
        assert_eq!(run("CANCELLED").status, RunStatus::Cancelled);
        assert!(run("QUEUED").status.is_active());

        let encoded = serde_json::to_value(run("COMPLETED")).unwrap();
        assert_eq!(encoded["status"], "completed");
    }

    #[test]
    fn test_inspector_tab_accepts_both_cases() {
        let tab: InspectorTab = serde_json::from_value(json!("HELD")).unwrap();
        assert_eq!(tab, InspectorTab::Held);
        let tab: InspectorTab = serde_json::from_value(json!("failed")).unwrap();
        assert_eq!(tab, InspectorTab::Failed);

        assert_eq!("PROCESSING".parse::<InspectorTab>(), Ok(InspectorTab::Processing));

        let status: DocumentStatus = serde_json::from_value(json!("UNROUTED")).unwrap();
        assert_eq!(status, DocumentStatus::Unrouted);
    }
}
