//! Mock implementations of the remote workflow API.

mod config;
mod operation;
mod provider;
mod state;

pub use config::MockFlowConfig;
pub use operation::MockOperation;
pub use provider::MockFlowProvider;
