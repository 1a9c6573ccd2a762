#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod deletion;
mod draft;
pub mod inspector;
pub mod interaction;
pub mod poll;
pub mod run;
pub mod store;

pub use deletion::{DeletionCoordinator, DeletionReport};
pub use draft::{ConnectionDraft, ConnectionDraftController, DraftState};
pub use inspector::{InspectorScope, InspectorSnapshot, NodeInspector, NodeSummaryPoller};
pub use poll::{PollHandle, PollerConfig};
pub use run::{DocumentSet, RunOverlay, RunPhase, RunSnapshot, RunStatusPoller};
pub use store::{GraphState, GraphStore, NodeEdit};
