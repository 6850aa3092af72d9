//! Task handlers and the registry that resolves them

use std::collections::HashMap;

use async_trait::async_trait;

use gantry_model::{Task, TaskOutcome};

use crate::context::TaskContext;
use crate::error::{EngineError, Result};

/// Terminal outcome a handler reports for its task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    /// The reported outcome
    pub outcome: TaskOutcome,
    /// Human-readable reason for the outcome
    pub reason: String,
}

impl Termination {
    /// The work completed
    pub fn success(reason: impl Into<String>) -> Self {
        Self {
            outcome: TaskOutcome::Success,
            reason: reason.into(),
        }
    }

    /// The work ran but did not succeed
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            outcome: TaskOutcome::Failure,
            reason: reason.into(),
        }
    }

    /// An infrastructure or precondition problem prevented the work
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            outcome: TaskOutcome::Error,
            reason: reason.into(),
        }
    }
}

/// Executable logic bound to a task's handler reference
///
/// Returning a [`Termination`] is the only way for a handler to finish;
/// there is no outcome-less return. A handler that returns `Err` has its
/// error recorded as an ERROR outcome on the task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute the task within the given context
    async fn handle(&self, context: &mut TaskContext) -> Result<Termination>;
}

impl std::fmt::Debug for dyn TaskHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn TaskHandler")
    }
}

/// Resolves a task's handler reference to executable logic
pub trait HandlerFactory: Send + Sync {
    /// Create the handler for this task
    ///
    /// Fails when the reference is not supported; that is a workflow
    /// definition error and aborts the whole run.
    fn create_handler(&self, task: &Task) -> Result<Box<dyn TaskHandler>>;
}

type HandlerConstructor = Box<dyn Fn(&Task) -> Box<dyn TaskHandler> + Send + Sync>;

/// Factory backed by a map from handler reference to constructor
#[derive(Default)]
pub struct HandlerRegistry {
    constructors: HashMap<String, HandlerConstructor>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under a handler reference
    pub fn register<F>(&mut self, handler: impl Into<String>, constructor: F)
    where
        F: Fn(&Task) -> Box<dyn TaskHandler> + Send + Sync + 'static,
    {
        self.constructors
            .insert(handler.into(), Box::new(constructor));
    }
}

impl HandlerFactory for HandlerRegistry {
    fn create_handler(&self, task: &Task) -> Result<Box<dyn TaskHandler>> {
        match self.constructors.get(&task.handler) {
            Some(constructor) => Ok(constructor(task)),
            None => Err(EngineError::UnsupportedHandler {
                handler: task.handler.clone(),
            }),
        }
    }
}
