//! Workflow header type.

use serde::{Deserialize, Serialize};

use crate::id::WorkflowId;

/// A workflow's identity and publication state.
///
/// Nodes and edges are loaded separately; see the editor's graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Identifier assigned by the remote system.
    pub id: WorkflowId,
    /// Display name.
    pub name: String,
    /// Whether the workflow accepts documents outside of test runs.
    #[serde(default)]
    pub published: bool,
}
