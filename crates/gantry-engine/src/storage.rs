//! Task storage locations

use std::path::{Path, PathBuf};

use gantry_model::{ResultId, Task};

/// Maps a task attempt to the filesystem locations the engine uses
///
/// Implementations must be deterministic: the same task and result identity
/// always map to the same paths. The paths need not exist; the engine
/// creates and removes them as part of the task lifecycle.
pub trait TaskStorage: Send + Sync {
    /// Directory where the result document, stamp, and artifacts live
    fn result_dir(&self, task: &Task, result_id: &ResultId) -> PathBuf;

    /// Scratch directory for one execution attempt
    fn work_dir(&self, task: &Task, result_id: &ResultId) -> PathBuf;
}

/// Storage rooted at a single directory
///
/// Results live under `<root>/results/<task-id>/<result-id>` and work
/// directories under `<root>/work/<task-id>/<result-id>`.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Create storage rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TaskStorage for DirectoryStorage {
    fn result_dir(&self, task: &Task, result_id: &ResultId) -> PathBuf {
        self.root
            .join("results")
            .join(&task.id)
            .join(result_id.as_str())
    }

    fn work_dir(&self, task: &Task, result_id: &ResultId) -> PathBuf {
        self.root
            .join("work")
            .join(&task.id)
            .join(result_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_storage_layout() {
        let storage = DirectoryStorage::new("/srv/gantry");
        let task = Task::new("compile", "make");
        let id = ResultId("CAFE".to_string());

        assert_eq!(
            storage.result_dir(&task, &id),
            PathBuf::from("/srv/gantry/results/compile/CAFE")
        );
        assert_eq!(
            storage.work_dir(&task, &id),
            PathBuf::from("/srv/gantry/work/compile/CAFE")
        );
    }

    #[test]
    fn test_directory_storage_deterministic() {
        let storage = DirectoryStorage::new("/srv/gantry");
        let task = Task::new("compile", "make");
        let id = ResultId("CAFE".to_string());

        assert_eq!(storage.result_dir(&task, &id), storage.result_dir(&task, &id));
    }
}
