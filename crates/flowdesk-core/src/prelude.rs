//! Convenient re-exports for common use.

pub use crate::graph::{
    DEFAULT_PORT, Edge, Node, NodeConfig, NodeKind, NodePorts, Port, PortRole, Position,
    Workflow, place, resolve_ports,
};
pub use crate::id::{DocumentId, EdgeId, InstanceId, NodeId, RunId, WorkflowId};
pub use crate::provider::{
    CreateEdge, CreateNode, DeletionConflict, FlowProvider, FlowService, NodeDeletion,
    UpdateNode, UploadDocument,
};
pub use crate::run::{
    DocumentInstance, DocumentStatus, InspectorTab, NodeStatusCount, NodeSummary, Run, RunStatus,
};
pub use crate::{Error, ErrorKind, Result};
