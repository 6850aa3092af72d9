//! Gantry Engine - Cached DAG task execution
//!
//! This crate executes a workflow's task graph to completion: dependency
//! resolution, one worker per eligible task, content-addressed result
//! caching on disk, throttled execution, and lifecycle notification
//! through listeners. The data model lives in `gantry-model` and is
//! re-exported here so embedders only need one dependency.

pub mod context;
pub mod error;
pub mod finished;
pub mod handler;
mod identity;
pub mod listener;
pub mod scheduler;
pub mod storage;
pub mod throttle;
mod worker;

pub use context::TaskContext;
pub use error::{EngineError, Result};
pub use finished::FinishedTask;
pub use handler::{HandlerFactory, HandlerRegistry, TaskHandler, Termination};
pub use listener::{CollectingListener, ExecutionEvent, ExecutionListener, TracingListener};
pub use scheduler::WorkflowExecutor;
pub use storage::{DirectoryStorage, TaskStorage};
pub use throttle::{SemaphoreThrottle, TaskThrottle};
pub use worker::{RESULT_FILE, STAMP_FILE};

pub use gantry_model::{
    Artifact, ModelError, Parameter, ResultId, Task, TaskOutcome, TaskResult, Workflow,
    WorkflowBuilder,
};
