//! Response bodies returned by the workflow API.

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// Acknowledgment of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    /// Identifier of the stored document.
    pub id: DocumentId,
}

/// Documents blocking a node deletion.
///
/// Returned by the API with HTTP 409 when a node still holds documents and
/// the deletion was not forced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionConflict {
    /// Documents held at the node.
    #[serde(default)]
    pub held_count: u32,
    /// Documents at the node that could not be routed.
    #[serde(default)]
    pub unrouted_count: u32,
}

/// Outcome of a node deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDeletion {
    /// The node was deleted.
    Deleted,
    /// The node still holds documents and was left in place.
    Conflict(DeletionConflict),
}

impl NodeDeletion {
    /// Returns whether the node was deleted.
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}
