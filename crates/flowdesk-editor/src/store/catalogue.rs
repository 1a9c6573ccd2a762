//! Node catalogue drag payloads.

use flowdesk_core::graph::NodeKind;
use flowdesk_core::{Error, Result};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Payload carried when a node type is dragged from the catalogue onto the
/// canvas: `{"type": "EXTRACTOR", "label": "Extractor"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CataloguePayload {
    /// Node type to create.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display name for the new node.
    pub label: String,
}

impl CataloguePayload {
    /// Creates the payload for a node type with its catalogue label.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            label: kind.label().to_owned(),
        }
    }

    /// Parses a JSON drag payload.
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| {
            Error::invalid_input()
                .with_message(format!("invalid catalogue payload: {e}"))
                .with_source(e)
        })
    }

    /// Encodes the payload as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the display name, falling back to the type label when blank.
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            self.kind.label()
        } else {
            &self.label
        }
    }
}

/// Returns the payload of every node type, in catalogue order.
pub fn catalogue() -> Vec<CataloguePayload> {
    NodeKind::iter().map(CataloguePayload::new).collect()
}
