#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{MockFlowConfig, MockFlowProvider, MockOperation};

/// Tracing target for mock provider calls.
pub const TRACING_TARGET: &str = "flowdesk_test::mock";
