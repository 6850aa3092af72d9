//! Gantry Model - Workflow data model
//!
//! Immutable value types describing units of work, their declared outputs,
//! and the results recorded when they execute, plus the JSON encoding used
//! to persist them. The execution engine lives in `gantry-engine`; this
//! crate has no runtime dependencies and can be used on its own to define
//! and inspect workflows.

pub mod artifact;
pub mod error;
pub mod result;
pub mod task;
pub mod workflow;

pub use artifact::Artifact;
pub use error::ModelError;
pub use result::{ResultId, TaskOutcome, TaskResult};
pub use task::{Parameter, Task};
pub use workflow::{Workflow, WorkflowBuilder};
