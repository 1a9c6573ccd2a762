//! Operations of the remote API, used for failure injection and call counts.

use strum::{AsRefStr, Display, EnumIter};

/// One operation of the remote workflow API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MockOperation {
    ListWorkflows,
    GetWorkflow,
    CreateWorkflow,
    UpdateWorkflow,
    DeleteWorkflow,
    ListNodes,
    CreateNode,
    UpdateNode,
    DeleteNode,
    ListEdges,
    CreateEdge,
    DeleteEdge,
    UploadDocument,
    CreateRun,
    GetRun,
    GetRunNodeCounts,
    GetNodeSummary,
    ListNodeDocuments,
    ListOrphanedDocuments,
    DeleteDocument,
    Retrigger,
}
