//! `?node=<id>` deep links.

use flowdesk_core::graph::Position;
use flowdesk_core::id::NodeId;
use url::form_urlencoded;

use super::Selection;
use crate::store::GraphState;

/// Query parameter naming the node to focus on load.
pub const DEEP_LINK_NODE_PARAM: &str = "node";

/// A parsed deep link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepLink {
    /// Node to focus and select.
    pub node_id: NodeId,
}

impl DeepLink {
    /// Parses the query string of an editor URL, with or without the
    /// leading `?`.
    ///
    /// Returns `None` when the parameter is missing or not a node id.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == DEEP_LINK_NODE_PARAM)
            .and_then(|(_, value)| value.parse().ok())
            .map(|node_id| Self { node_id })
    }

    /// Encodes the deep link as a query string without the leading `?`.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(DEEP_LINK_NODE_PARAM, &self.node_id.to_string())
            .finish()
    }

    /// Selects the linked node and returns its position for focusing.
    ///
    /// Leaves the selection alone and returns `None` when the node is not
    /// part of the loaded graph.
    pub fn apply(&self, state: &GraphState, selection: &mut Selection) -> Option<Position> {
        let node = state.node(self.node_id)?;
        selection.select_only(node.id);
        Some(node.position)
    }
}
