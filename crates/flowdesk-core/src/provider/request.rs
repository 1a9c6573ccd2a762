//! Request bodies sent to the workflow API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::graph::{NodeConfig, NodeKind, Position};
use crate::id::{DocumentId, InstanceId, NodeId};

/// Request body for creating a workflow.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflow {
    /// Workflow name.
    pub name: String,
}

/// Request body for renaming or (un)publishing a workflow.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflow {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New publication state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl UpdateWorkflow {
    /// Renames the workflow.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            published: None,
        }
    }

    /// Sets the publication state.
    pub fn publish(published: bool) -> Self {
        Self {
            name: None,
            published: Some(published),
        }
    }
}

/// Request body for creating a node.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNode {
    /// Node type.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// Canvas x coordinate.
    pub x: f32,
    /// Canvas y coordinate.
    pub y: f32,
}

impl CreateNode {
    /// Creates a request for a node at the given position.
    pub fn new(kind: NodeKind, name: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            name: name.into(),
            x: position.x,
            y: position.y,
        }
    }

    /// Returns the requested position.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Request body for a partial node update.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNode {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New x coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New untagged configuration object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl UpdateNode {
    /// Moves the node.
    pub fn position(position: Position) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Default::default()
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: &NodeConfig) -> Result<Self> {
        self.config = Some(config.to_value()?);
        Ok(self)
    }

    /// Returns whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.x.is_none() && self.y.is_none() && self.config.is_none()
    }
}

/// Request body for connecting two ports.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdge {
    /// Node the edge leaves from.
    pub source_node_id: NodeId,
    /// Output port on the source node.
    pub source_port: String,
    /// Node the edge arrives at.
    pub target_node_id: NodeId,
    /// Input port on the target node.
    pub target_port: String,
}

impl CreateEdge {
    /// Creates a connection request.
    pub fn new(
        source_node_id: NodeId,
        source_port: impl Into<String>,
        target_node_id: NodeId,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id,
            source_port: source_port.into(),
            target_node_id,
            target_port: target_port.into(),
        }
    }
}

/// A file handed to the workflow for a run.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDocument {
    /// Original file name.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub content: Bytes,
    /// Trigger node the document is destined for; `None` when unscoped.
    pub trigger_node_id: Option<NodeId>,
}

impl UploadDocument {
    /// Creates an unscoped upload.
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            content: content.into(),
            trigger_node_id: None,
        }
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Scopes the upload to a trigger node.
    pub fn for_trigger(mut self, trigger_node_id: NodeId) -> Self {
        self.trigger_node_id = Some(trigger_node_id);
        self
    }
}

/// Request body for creating a run.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRun {
    /// Uploaded documents grouped by trigger node.
    pub documents: Vec<RunDocumentGroup>,
}

/// Uploaded documents injected at one trigger node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDocumentGroup {
    /// Trigger node; `None` for workflows without explicit triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_node_id: Option<NodeId>,
    /// Uploaded documents.
    pub document_ids: Vec<DocumentId>,
}

/// Request body for re-injecting document instances into trigger nodes.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retrigger {
    /// Instances to re-inject.
    pub instance_ids: Vec<InstanceId>,
    /// Trigger nodes receiving the instances.
    pub trigger_node_ids: Vec<NodeId>,
}

impl Retrigger {
    /// Creates a re-trigger request.
    pub fn new(instance_ids: Vec<InstanceId>, trigger_node_ids: Vec<NodeId>) -> Self {
        Self {
            instance_ids,
            trigger_node_ids,
        }
    }
}
