//! Workflow aggregate and builder

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::result::TaskResult;
use crate::task::Task;

/// A task graph together with the results accumulated while executing it
///
/// The task list is the static graph, fixed for the duration of a run. The
/// result list is append-only and grows as tasks reach a terminal state;
/// the final workflow returned by the engine is the externally visible end
/// state of a run, complete or frozen partial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    /// The static task graph
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Results recorded so far, at most one meaningful entry per task id
    #[serde(default)]
    pub results: Vec<TaskResult>,
}

impl Workflow {
    /// Create a workflow from a task list, with no results yet
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            results: Vec::new(),
        }
    }

    /// Look up the result recorded for a task id
    pub fn result_for(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.iter().find(|result| result.task_id == task_id)
    }

    /// Serialize to a pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a workflow from a JSON file
    pub fn read_json_file(path: &Path) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write the workflow to a JSON file
    pub fn write_json_file(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Incremental builder used to grow a workflow as execution progresses
///
/// Unlike the usual consuming builder, `build` borrows and clones so the
/// same builder can produce a snapshot per lifecycle event.
#[derive(Debug, Clone, Default)]
pub struct WorkflowBuilder {
    tasks: Vec<Task>,
    results: Vec<TaskResult>,
}

impl WorkflowBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task to the graph
    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Append a result
    pub fn add_result(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    /// Build a snapshot of the current state
    pub fn build(&self) -> Workflow {
        Workflow {
            tasks: self.tasks.clone(),
            results: self.results.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;
    use crate::result::{ResultId, TaskOutcome};
    use chrono::Utc;

    fn result_for_task(task_id: &str) -> TaskResult {
        TaskResult::new(
            ResultId(format!("ID-{}", task_id)),
            task_id,
            vec![Artifact::new("log", "out.log")],
            TaskOutcome::Success,
            "done",
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_builder_snapshots_are_independent() {
        let mut builder = WorkflowBuilder::new();
        builder.add_task(Task::new("a", "noop"));

        let before = builder.build();
        builder.add_result(result_for_task("a"));
        let after = builder.build();

        assert!(before.results.is_empty());
        assert_eq!(after.results.len(), 1);
        assert_eq!(after.tasks.len(), 1);
    }

    #[test]
    fn test_result_for() {
        let mut builder = WorkflowBuilder::new();
        builder.add_task(Task::new("a", "noop"));
        builder.add_task(Task::new("b", "noop"));
        builder.add_result(result_for_task("b"));
        let workflow = builder.build();

        assert!(workflow.result_for("a").is_none());
        assert_eq!(workflow.result_for("b").unwrap().task_id, "b");
    }

    #[test]
    fn test_workflow_file_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("workflow.json");

        let workflow = Workflow::new(vec![
            Task::new("a", "noop").with_parameter("k", "v"),
            Task::new("b", "noop").with_dependency("a"),
        ]);
        workflow.write_json_file(&path).unwrap();

        let back = Workflow::read_json_file(&path).unwrap();
        assert_eq!(back.tasks.len(), 2);
        assert_eq!(back.tasks[1].dependencies, vec!["a"]);
        assert!(back.results.is_empty());
    }

    #[test]
    fn test_workflow_from_json_rejects_garbage() {
        assert!(Workflow::from_json("not json").is_err());
    }
}
