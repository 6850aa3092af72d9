//! Execution context handed to task handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gantry_model::{Artifact, Task};

use crate::error::{EngineError, Result};
use crate::finished::FinishedTask;

/// Everything a handler may see and touch while executing one task
///
/// The context is private to one execution attempt. Artifacts declared
/// through it end up in the task's result once the handler returns.
pub struct TaskContext {
    task: Arc<Task>,
    dependencies: Vec<FinishedTask>,
    work_dir: PathBuf,
    result_dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl TaskContext {
    pub(crate) fn new(
        task: Arc<Task>,
        dependencies: Vec<FinishedTask>,
        work_dir: PathBuf,
        result_dir: PathBuf,
    ) -> Self {
        Self {
            task,
            dependencies,
            work_dir,
            result_dir,
            artifacts: Vec::new(),
        }
    }

    /// The task being executed
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The task's finished dependencies, in dependency-list order
    pub fn dependencies(&self) -> &[FinishedTask] {
        &self.dependencies
    }

    /// Scratch directory for this attempt; removed after the handler returns
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Directory where declared artifacts must be written
    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Paths of all dependency artifacts of the given type
    ///
    /// Searches every dependency in dependency-list order and returns all
    /// matches; an empty result is not an error here.
    pub fn dependency_artifacts(&self, kind: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for dependency in &self.dependencies {
            for artifact in &dependency.result().artifacts {
                if artifact.kind == kind {
                    paths.push(dependency.artifact_path(artifact));
                }
            }
        }
        paths
    }

    /// Path of the single dependency artifact of the given type
    ///
    /// Fails unless exactly one artifact matches across all dependencies.
    pub fn dependency_artifact(&self, kind: &str) -> Result<PathBuf> {
        let mut paths = self.dependency_artifacts(kind);
        if paths.len() != 1 {
            return Err(EngineError::DependencyArtifact {
                task: self.task.id.clone(),
                kind: kind.to_string(),
                count: paths.len(),
            });
        }
        Ok(paths.remove(0))
    }

    /// Declare an output artifact and return the path to write it to
    ///
    /// The file is not created here; the handler must write it. The name
    /// must be unique within this task's result.
    pub fn add_artifact(&mut self, kind: impl Into<String>, name: impl Into<String>) -> PathBuf {
        let artifact = Artifact::new(kind, name);
        let path = self.result_dir.join(&artifact.name);
        self.artifacts.push(artifact);
        path
    }

    pub(crate) fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}
