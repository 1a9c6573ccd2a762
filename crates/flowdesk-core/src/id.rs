//! Identifier newtypes.
//!
//! Every identifier is assigned by the remote system and wraps a UUID. The
//! newtypes keep node, edge, run and document identifiers from being mixed
//! up at call sites.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[derive(Debug, Display, From, Into)]
        #[debug("{_0}")]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an identifier from an existing UUID.
            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[inline]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::from_str(s)?))
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier of a workflow.
    WorkflowId
);

define_id!(
    /// Unique identifier of a node within a workflow.
    NodeId
);

define_id!(
    /// Unique identifier of an edge within a workflow.
    EdgeId
);

define_id!(
    /// Unique identifier of a workflow run.
    RunId
);

define_id!(
    /// Unique identifier of an uploaded document.
    DocumentId
);

define_id!(
    /// Unique identifier of a document instance travelling through a run.
    InstanceId
);
