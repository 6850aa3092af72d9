//! Task and parameter types

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named string parameter passed to a task's handler
///
/// Names are not required to be unique within a task; their meaning is
/// entirely handler-specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

impl Parameter {
    /// Create a new parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single unit of work in a workflow
///
/// Tasks are defined once when the workflow is built and never mutated
/// afterwards; during a run they are shared read-only between the
/// scheduler and its workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id within the workflow
    pub id: String,

    /// Opaque reference to the handler that executes this task, resolved
    /// by the handler factory at execution time
    pub handler: String,

    /// Ids of tasks that must finish successfully before this one may
    /// start; order carries no scheduling priority
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Ordered handler-specific parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Task {
    /// Create a new task with no dependencies or parameters
    pub fn new(id: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handler: handler.into(),
            dependencies: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Add a dependency on another task
    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }

    /// Add a handler parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("compile", "make")
            .with_dependency("fetch")
            .with_dependency("configure")
            .with_parameter("target", "release");

        assert_eq!(task.id, "compile");
        assert_eq!(task.handler, "make");
        assert_eq!(task.dependencies, vec!["fetch", "configure"]);
        assert_eq!(task.parameters, vec![Parameter::new("target", "release")]);
    }

    #[test]
    fn test_task_display() {
        let task = Task::new("compile", "make");
        assert_eq!(task.to_string(), "compile");
    }

    #[test]
    fn test_parameter_order_preserved() {
        let task = Task::new("t", "h")
            .with_parameter("k", "1")
            .with_parameter("k", "2");

        assert_eq!(task.parameters[0].value, "1");
        assert_eq!(task.parameters[1].value, "2");
    }

    #[test]
    fn test_task_deserialize_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": "a", "handler": "noop"}"#).unwrap();
        assert!(task.dependencies.is_empty());
        assert!(task.parameters.is_empty());
    }
}
