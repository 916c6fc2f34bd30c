//! Core data models and the connection-selection-sync state machine

mod gateway;
mod plan;
mod quota;
mod session;
mod workflow;

pub use gateway::*;
pub use plan::*;
pub use quota::*;
pub use session::*;
pub use workflow::{SyncWorkflow, WorkflowError, WorkflowPhase};
