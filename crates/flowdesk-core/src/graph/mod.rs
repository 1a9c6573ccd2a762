//! Workflow graph model.
//!
//! This module contains the node, edge and workflow types the editor works
//! on, together with the two pure algorithms that operate on them:
//! [`resolve_ports`] and [`place`].

mod config;
mod edge;
mod kind;
mod node;
mod placement;
mod port;
mod position;
mod workflow;

pub use config::{
    Assignment, CategorisationConfig, Condition, ConditionOperator, ConditionalIfConfig,
    ConditionalSwitchConfig, DataMapperConfig, DocumentFolderConfig, ExtractorConfig,
    FieldMapping, HttpMethod, HttpOutputConfig, ManualUploadConfig, NodeConfig,
    ReconciliationConfig, ReconciliationSlot, SetValueConfig, SplittingConfig, SwitchCase,
    WebhookConfig,
};
pub use edge::Edge;
pub use kind::NodeKind;
pub use node::Node;
pub use placement::{
    HORIZONTAL_STEP, MAX_ATTEMPTS, NODE_HEIGHT, NODE_WIDTH, PROBES_PER_ROW, Placement,
    VERTICAL_STEP, find_free_position, overlaps, place,
};
pub use port::{
    DEFAULT_PORT, FALLBACK_PORT, FALSE_PORT, NodePorts, Port, PortRole, TRUE_PORT, resolve_ports,
};
pub use position::Position;
pub use workflow::Workflow;
