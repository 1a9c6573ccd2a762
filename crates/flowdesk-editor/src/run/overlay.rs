//! Per-node run status overlay.

use std::collections::{BTreeSet, HashMap};

use flowdesk_core::graph::Edge;
use flowdesk_core::id::NodeId;
use flowdesk_core::run::{DocumentStatus, NodeStatusCount};

/// Latest per-node status samples of a run.
///
/// Built from one poll response and replaced wholesale on the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverlay {
    samples: HashMap<NodeId, Vec<NodeStatusCount>>,
}

impl RunOverlay {
    /// Groups samples by node. Samples with a zero count are dropped.
    pub fn from_samples(samples: impl IntoIterator<Item = NodeStatusCount>) -> Self {
        let mut grouped: HashMap<NodeId, Vec<NodeStatusCount>> = HashMap::new();
        for sample in samples.into_iter().filter(|s| s.count > 0) {
            grouped.entry(sample.node_id).or_default().push(sample);
        }

        Self { samples: grouped }
    }

    /// Returns whether no node has any documents.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the samples of one node.
    pub fn samples(&self, node_id: NodeId) -> &[NodeStatusCount] {
        self.samples
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the nodes that have samples.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.samples.keys().copied()
    }

    /// Returns the total document count of one status at a node.
    pub fn count(&self, node_id: NodeId, status: DocumentStatus) -> u32 {
        self.samples(node_id)
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.count)
            .sum()
    }

    /// Returns the status a node is drawn with.
    ///
    /// Precedence is processing, failed, held, unrouted; a node is completed
    /// only when every sample is completed. Nodes without samples have no
    /// status.
    pub fn dominant_status(&self, node_id: NodeId) -> Option<DocumentStatus> {
        let samples = self.samples(node_id);
        let has = |status: DocumentStatus| samples.iter().any(|s| s.status == status);

        [
            DocumentStatus::Processing,
            DocumentStatus::Failed,
            DocumentStatus::Held,
            DocumentStatus::Unrouted,
        ]
        .into_iter()
        .find(|status| has(*status))
        .or_else(|| {
            (!samples.is_empty() && samples.iter().all(|s| s.status == DocumentStatus::Completed))
                .then_some(DocumentStatus::Completed)
        })
    }

    /// Returns whether completed documents left `node_id` through `port`.
    ///
    /// An untagged sample counts for the unnamed default port.
    pub fn is_port_active(&self, node_id: NodeId, port: &str) -> bool {
        self.samples(node_id)
            .iter()
            .any(|s| s.status == DocumentStatus::Completed && s.output_port_or_default() == port)
    }

    /// Returns the output ports completed documents left a node through.
    pub fn active_output_ports(&self, node_id: NodeId) -> BTreeSet<&str> {
        self.samples(node_id)
            .iter()
            .filter(|s| s.status == DocumentStatus::Completed)
            .map(NodeStatusCount::output_port_or_default)
            .collect()
    }

    /// Returns whether an edge is highlighted: its source port is active.
    pub fn is_edge_active(&self, edge: &Edge) -> bool {
        self.is_port_active(edge.source_node_id, &edge.source_port)
    }
}
