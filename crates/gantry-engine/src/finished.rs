//! Finished tasks

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gantry_model::{Artifact, Task, TaskResult};

/// A task paired with its terminal result and the directory holding it
///
/// Handed to dependent tasks so they can resolve the paths of artifacts
/// they consume. Cloning is cheap; the task and result are shared.
#[derive(Debug, Clone)]
pub struct FinishedTask {
    task: Arc<Task>,
    result: Arc<TaskResult>,
    result_dir: PathBuf,
}

impl FinishedTask {
    /// Pair a task with its result and result directory
    pub fn new(task: Arc<Task>, result: TaskResult, result_dir: PathBuf) -> Self {
        Self {
            task,
            result: Arc::new(result),
            result_dir,
        }
    }

    /// The finished task
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The recorded result
    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    /// Directory holding the result document and artifacts
    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Path of one of this task's artifacts
    pub fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
        self.result_dir.join(&artifact.name)
    }
}
