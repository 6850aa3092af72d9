//! Per-task execution lifecycle

use std::io;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::fs;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use gantry_model::{ResultId, Task, TaskResult};

use crate::context::TaskContext;
use crate::error::{EngineError, Result};
use crate::finished::FinishedTask;
use crate::handler::{HandlerFactory, Termination};
use crate::identity::compute_result_id;
use crate::storage::TaskStorage;
use crate::throttle::TaskThrottle;

/// Name of the persisted result document inside a result directory
pub const RESULT_FILE: &str = "result.json";

/// Name of the marker file whose presence makes a cached result eligible
/// for reuse
pub const STAMP_FILE: &str = "stamp";

/// Messages workers post back to the scheduler
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    /// The task passed the cache check and is about to execute
    Running(Arc<Task>),
    /// The task reached a terminal outcome
    Finished(FinishedTask),
    /// A valid cached result was reused without executing
    Reused(FinishedTask),
    /// The run must abort; no result was produced for this task
    Fatal {
        task: Arc<Task>,
        error: EngineError,
    },
}

/// Drives exactly one task to a terminal state and reports it exactly once
pub(crate) struct TaskExecutor {
    task: Arc<Task>,
    dependencies: Vec<FinishedTask>,
    result_id: ResultId,
    result_dir: PathBuf,
    work_dir: PathBuf,
    throttle: Arc<dyn TaskThrottle>,
    factory: Arc<dyn HandlerFactory>,
    events: UnboundedSender<WorkerEvent>,
}

impl TaskExecutor {
    /// Bind a worker to a task and its resolved dependencies
    ///
    /// The result identity, and with it the storage addresses, are fixed
    /// here, before anything runs.
    pub(crate) fn new(
        task: Arc<Task>,
        dependencies: Vec<FinishedTask>,
        storage: &dyn TaskStorage,
        throttle: Arc<dyn TaskThrottle>,
        factory: Arc<dyn HandlerFactory>,
        events: UnboundedSender<WorkerEvent>,
    ) -> Self {
        let result_id = compute_result_id(&task, &dependencies);
        let result_dir = storage.result_dir(&task, &result_id);
        let work_dir = storage.work_dir(&task, &result_id);
        Self {
            task,
            dependencies,
            result_id,
            result_dir,
            work_dir,
            throttle,
            factory,
            events,
        }
    }

    /// Run the task to a terminal state and post the outcome
    pub(crate) async fn run(self) {
        match self.reusable_cached_result().await {
            Ok(Some(finished)) => {
                debug!(task = %self.task.id, id = %self.result_id, "reusing cached result");
                let _ = self.events.send(WorkerEvent::Reused(finished));
                return;
            }
            Ok(None) => {}
            Err(error) => {
                let _ = self.events.send(WorkerEvent::Fatal {
                    task: self.task.clone(),
                    error,
                });
                return;
            }
        }

        let _ = self.events.send(WorkerEvent::Running(self.task.clone()));

        // A panic from a collaborator (factory, throttle, storage-created
        // paths) must not strand the scheduler waiting for a report that
        // never comes; it aborts the run instead.
        let event = match AssertUnwindSafe(self.execute()).catch_unwind().await {
            Ok(Ok(finished)) => WorkerEvent::Finished(finished),
            Ok(Err(error)) => WorkerEvent::Fatal {
                task: self.task.clone(),
                error,
            },
            Err(_) => WorkerEvent::Fatal {
                task: self.task.clone(),
                error: EngineError::WorkerPanicked {
                    task: self.task.id.clone(),
                },
            },
        };
        let _ = self.events.send(event);
    }

    /// Check for a reusable cached result at this worker's result address
    ///
    /// Reusable means the stamp marker is present and the cached result
    /// logically started no earlier than every dependency finished. The
    /// timestamp comparison guards against a result directory populated
    /// against older dependency state; it does not re-validate the
    /// dependencies' own cache lineage.
    async fn reusable_cached_result(&self) -> Result<Option<FinishedTask>> {
        if !self.result_dir.join(STAMP_FILE).is_file() {
            debug!(task = %self.task.id, id = %self.result_id, "cache miss");
            return Ok(None);
        }

        let contents = fs::read_to_string(self.result_dir.join(RESULT_FILE)).await?;
        let result = TaskResult::from_json(&contents)?;

        for dependency in &self.dependencies {
            if dependency.result().time_finished > result.time_started {
                debug!(
                    task = %self.task.id,
                    dependency = %dependency.task().id,
                    "cached result is stale"
                );
                return Ok(None);
            }
        }

        Ok(Some(FinishedTask::new(
            self.task.clone(),
            result,
            self.result_dir.clone(),
        )))
    }

    /// Execute the task and build its result
    async fn execute(&self) -> Result<FinishedTask> {
        let mut context = TaskContext::new(
            self.task.clone(),
            self.dependencies.clone(),
            self.work_dir.clone(),
            self.result_dir.clone(),
        );

        let time_started;
        let time_finished;
        let invoked: Result<Termination>;

        match self.prepare_directories().await {
            Ok(()) => {
                self.throttle.acquire_capacity(&self.task).await;
                let _capacity = CapacityGuard {
                    throttle: self.throttle.as_ref(),
                    task: &self.task,
                };
                time_started = Utc::now();
                invoked = self.invoke_handler(&mut context).await;
                time_finished = Utc::now();
            }
            Err(err) => {
                time_started = Utc::now();
                time_finished = time_started;
                invoked = Ok(Termination::error(format!(
                    "I/O error while setting up task directories: {}",
                    err
                )));
            }
        }

        // The work directory is ephemeral regardless of how the handler
        // fared; a teardown failure degrades the outcome to an error.
        let teardown = remove_dir_if_exists(&self.work_dir).await;
        let mut termination = invoked?;
        if let Err(err) = teardown {
            termination = Termination::error(format!(
                "I/O error while removing work directory: {}",
                err
            ));
        }

        let result = TaskResult::new(
            self.result_id.clone(),
            self.task.id.clone(),
            context.into_artifacts(),
            termination.outcome,
            termination.reason,
            time_started,
            time_finished,
        );

        if result.outcome.is_success() {
            self.persist(&result).await?;
        }

        Ok(FinishedTask::new(
            self.task.clone(),
            result,
            self.result_dir.clone(),
        ))
    }

    /// Reset the result and work directories to an empty state
    ///
    /// Leftovers from a crashed earlier attempt at the same address are
    /// removed so every attempt starts from a clean slate.
    async fn prepare_directories(&self) -> io::Result<()> {
        for dir in [&self.result_dir, &self.work_dir] {
            if let Some(parent) = dir.parent() {
                fs::create_dir_all(parent).await?;
            }
            remove_dir_if_exists(dir).await?;
            fs::create_dir(dir).await?;
        }
        Ok(())
    }

    /// Resolve the handler and invoke it
    ///
    /// Handler errors and panics become ERROR outcomes on the task; only an
    /// unresolvable handler reference escapes as a fatal error.
    async fn invoke_handler(&self, context: &mut TaskContext) -> Result<Termination> {
        let handler = self.factory.create_handler(&self.task)?;
        let invocation = AssertUnwindSafe(handler.handle(context)).catch_unwind().await;
        Ok(match invocation {
            Ok(Ok(termination)) => termination,
            Ok(Err(err)) => Termination::error(err.to_string()),
            Err(_) => Termination::error("task handler panicked"),
        })
    }

    /// Persist the result document, then the stamp, in that order
    ///
    /// A crash between the two writes leaves no stamp, and an absent stamp
    /// always means "not safely cacheable".
    async fn persist(&self, result: &TaskResult) -> Result<()> {
        fs::write(self.result_dir.join(RESULT_FILE), result.to_json()?).await?;
        fs::write(self.result_dir.join(STAMP_FILE), b"").await?;
        Ok(())
    }
}

/// Releases throttle capacity when dropped, tying the release to scope
/// exit so it happens on every path out of the execution phase
struct CapacityGuard<'a> {
    throttle: &'a dyn TaskThrottle,
    task: &'a Task,
}

impl Drop for CapacityGuard<'_> {
    fn drop(&mut self) {
        self.throttle.release_capacity(self.task);
    }
}

async fn remove_dir_if_exists(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir).await?;
    }
    Ok(())
}
