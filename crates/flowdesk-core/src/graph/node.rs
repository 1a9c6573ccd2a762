//! Workflow node type.

use serde::{Deserialize, Serialize};

use super::config::NodeConfig;
use super::kind::NodeKind;
use super::port::{NodePorts, resolve_ports};
use super::position::Position;
use crate::TRACING_TARGET;
use crate::id::NodeId;

/// A typed step in a workflow graph.
///
/// On the wire a node is a flat record `{id, type, name, x, y, config}`
/// where `config` is the untagged configuration object for `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    /// Identifier assigned by the remote system.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Position in canvas coordinates.
    pub position: Position,
    /// Type-specific configuration; also determines the node type.
    pub config: NodeConfig,
}

impl Node {
    /// Creates a node of the given type with its default configuration.
    pub fn new(id: NodeId, kind: NodeKind, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            config: NodeConfig::default_for(kind),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the node type.
    #[inline]
    pub const fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// Resolves the node's current input and output ports.
    pub fn ports(&self) -> NodePorts {
        resolve_ports(&self.config)
    }

    /// Returns whether documents enter the workflow at this node.
    #[inline]
    pub const fn is_trigger(&self) -> bool {
        self.kind().is_trigger()
    }
}

/// Flat wire representation of a [`Node`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NodeId,
    #[serde(rename = "type")]
    kind: NodeKind,
    name: String,
    x: f32,
    y: f32,
    #[serde(default)]
    config: serde_json::Value,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let config = NodeConfig::from_value(record.kind, record.config).unwrap_or_else(|err| {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %record.id,
                node_type = %record.kind,
                error = %err,
                "Malformed node configuration, falling back to defaults"
            );
            NodeConfig::default_for(record.kind)
        });

        Self {
            id: record.id,
            name: record.name,
            position: Position::new(record.x, record.y),
            config,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let config = node.config.to_value().unwrap_or_default();
        Self {
            id: node.id,
            kind: node.config.kind(),
            name: node.name,
            x: node.position.x,
            y: node.position.y,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::graph::config::ConditionalSwitchConfig;

    fn node_id(n: u128) -> NodeId {
        NodeId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn test_deserialize_flat_record() {
        let value = json!({
            "id": Uuid::from_u128(1),
            "type": "CONDITIONAL_SWITCH",
            "name": "Route",
            "x": 10.0,
            "y": 20.0,
            "config": { "cases": [{ "id": "case_1" }] }
        });

        let node: Node = serde_json::from_value(value).unwrap();
        assert_eq!(node.kind(), NodeKind::ConditionalSwitch);
        assert_eq!(node.position, Position::new(10.0, 20.0));
        assert_eq!(node.ports().output_ids(), vec!["case_1", "fallback"]);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let value = json!({
            "id": Uuid::from_u128(2),
            "type": "CONDITIONAL_SWITCH",
            "name": "Route",
            "x": 0.0,
            "y": 0.0,
            "config": { "cases": 42 }
        });

        let node: Node = serde_json::from_value(value).unwrap();
        assert_eq!(
            node.config,
            NodeConfig::ConditionalSwitch(ConditionalSwitchConfig::default())
        );
    }

    #[test]
    fn test_missing_config_is_default() {
        let value = json!({
            "id": Uuid::from_u128(3),
            "type": "EXTRACTOR",
            "name": "Extract",
            "x": 0.0,
            "y": 0.0
        });

        let node: Node = serde_json::from_value(value).unwrap();
        assert_eq!(node.config, NodeKind::Extractor.default_config());
    }

    #[test]
    fn test_serialize_flat_record() {
        let node = Node::new(node_id(4), NodeKind::ManualUpload, "Upload", Position::new(1.0, 2.0));
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["type"], "MANUAL_UPLOAD");
        assert_eq!(value["x"], 1.0);
        assert_eq!(value["config"], json!({}));
    }
}
