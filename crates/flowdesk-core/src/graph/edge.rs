//! Edge type connecting two node ports.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};

/// A directed connection from an output port of one node to an input port
/// of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Identifier assigned by the remote system.
    pub id: EdgeId,
    /// Node the edge leaves from.
    pub source_node_id: NodeId,
    /// Output port on the source node.
    pub source_port: String,
    /// Node the edge arrives at.
    pub target_node_id: NodeId,
    /// Input port on the target node.
    pub target_port: String,
}

impl Edge {
    /// Returns whether either end of the edge is attached to `node_id`.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }

    /// Returns whether this edge joins the same ports as another connection.
    pub fn joins(
        &self,
        source_node_id: NodeId,
        source_port: &str,
        target_node_id: NodeId,
        target_port: &str,
    ) -> bool {
        self.source_node_id == source_node_id
            && self.source_port == source_port
            && self.target_node_id == target_node_id
            && self.target_port == target_port
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_wire_format() {
        let edge = Edge {
            id: EdgeId::from_uuid(Uuid::from_u128(1)),
            source_node_id: NodeId::from_uuid(Uuid::from_u128(2)),
            source_port: "true".into(),
            target_node_id: NodeId::from_uuid(Uuid::from_u128(3)),
            target_port: "default".into(),
        };

        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["sourcePort"], "true");
        assert_eq!(value["targetNodeId"], Uuid::from_u128(3).to_string());
    }

    #[test]
    fn test_touches() {
        let a = NodeId::from_uuid(Uuid::from_u128(1));
        let b = NodeId::from_uuid(Uuid::from_u128(2));
        let c = NodeId::from_uuid(Uuid::from_u128(3));
        let edge = Edge {
            id: EdgeId::new(),
            source_node_id: a,
            source_port: "default".into(),
            target_node_id: b,
            target_port: "default".into(),
        };

        assert!(edge.touches(a));
        assert!(edge.touches(b));
        assert!(!edge.touches(c));
    }
}
