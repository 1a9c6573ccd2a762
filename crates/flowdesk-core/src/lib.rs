#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod graph;
pub mod id;
pub mod prelude;
pub mod provider;
pub mod run;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use provider::{FlowProvider, FlowService};

/// Tracing target for core domain events.
pub const TRACING_TARGET: &str = "flowdesk_core";
