//! Error types for the execution engine

use thiserror::Error;

use gantry_model::ModelError;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the execution engine
///
/// A handler returning `Err` is recorded as an ERROR outcome on its task.
/// Errors escaping `WorkflowExecutor::execute` itself are fatal: an
/// unresolvable handler reference, or a result document that cannot be
/// persisted or read back, both of which break the caching contract.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No handler is registered under the reference named by a task
    #[error("Unsupported task handler: {handler}")]
    UnsupportedHandler {
        /// The unresolvable handler reference
        handler: String,
    },

    /// An exactly-one dependency artifact lookup matched zero or several
    #[error("Task {task} expected exactly one dependency artifact of type {kind}, found {count}")]
    DependencyArtifact {
        /// Id of the task whose handler performed the lookup
        task: String,
        /// Requested artifact type
        kind: String,
        /// Number of artifacts actually found
        count: usize,
    },

    /// A worker panicked outside the handler invocation
    #[error("Worker for task {task} panicked")]
    WorkerPanicked {
        /// Id of the task whose worker died
        task: String,
    },

    /// Failed to encode or decode a persisted document
    #[error(transparent)]
    Model(#[from] ModelError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
