//! Workflow execution listeners

use std::sync::Mutex;

use gantry_model::{Task, Workflow};

use crate::finished::FinishedTask;

/// Observer notified of task and workflow lifecycle events
///
/// Listeners are invoked synchronously from the scheduler between state
/// transitions, each call receiving a snapshot of the workflow as it stood
/// when the event fired. A callback that blocks stalls the whole run, so
/// implementations should return quickly. All methods default to no-ops;
/// implementations override only what they need.
pub trait ExecutionListener: Send + Sync {
    /// Execution of the workflow has begun
    fn workflow_running(&self, _workflow: &Workflow) {}

    /// A task passed the cache check and is about to execute
    fn task_running(&self, _workflow: &Workflow, _task: &Task) {}

    /// A task finished with a success outcome
    fn task_succeeded(&self, _workflow: &Workflow, _finished: &FinishedTask) {}

    /// A task finished with a failure or error outcome
    fn task_failed(&self, _workflow: &Workflow, _finished: &FinishedTask) {}

    /// A valid cached result was reused; the task never executed
    fn task_reused(&self, _workflow: &Workflow, _finished: &FinishedTask) {}

    /// Every task reached a successful terminal state
    fn workflow_succeeded(&self, _workflow: &Workflow) {}

    /// At least one task failed, or could never start
    fn workflow_failed(&self, _workflow: &Workflow) {}
}

/// Listener that logs every lifecycle event to tracing
#[derive(Debug, Default)]
pub struct TracingListener;

impl ExecutionListener for TracingListener {
    fn workflow_running(&self, workflow: &Workflow) {
        tracing::info!(tasks = workflow.tasks.len(), "workflow running");
    }

    fn task_running(&self, _workflow: &Workflow, task: &Task) {
        tracing::info!(task = %task.id, handler = %task.handler, "task running");
    }

    fn task_succeeded(&self, _workflow: &Workflow, finished: &FinishedTask) {
        tracing::info!(
            task = %finished.task().id,
            reason = %finished.result().outcome_reason,
            "task succeeded"
        );
    }

    fn task_failed(&self, _workflow: &Workflow, finished: &FinishedTask) {
        tracing::error!(
            task = %finished.task().id,
            outcome = %finished.result().outcome,
            reason = %finished.result().outcome_reason,
            "task failed"
        );
    }

    fn task_reused(&self, _workflow: &Workflow, finished: &FinishedTask) {
        tracing::info!(task = %finished.task().id, "task reused cached result");
    }

    fn workflow_succeeded(&self, workflow: &Workflow) {
        tracing::info!(results = workflow.results.len(), "workflow succeeded");
    }

    fn workflow_failed(&self, workflow: &Workflow) {
        tracing::error!(results = workflow.results.len(), "workflow failed");
    }
}

/// Recorded form of one lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// Workflow execution began
    WorkflowRunning,
    /// The named task started executing
    TaskRunning(String),
    /// The named task succeeded
    TaskSucceeded(String),
    /// The named task failed or erred
    TaskFailed(String),
    /// The named task reused a cached result
    TaskReused(String),
    /// The workflow finished with every task successful
    WorkflowSucceeded,
    /// The workflow finished with unfinished or failed tasks
    WorkflowFailed,
}

/// Listener that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingListener {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl CollectingListener {
    /// Get all collected events, in notification order
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: ExecutionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ExecutionListener for CollectingListener {
    fn workflow_running(&self, _workflow: &Workflow) {
        self.record(ExecutionEvent::WorkflowRunning);
    }

    fn task_running(&self, _workflow: &Workflow, task: &Task) {
        self.record(ExecutionEvent::TaskRunning(task.id.clone()));
    }

    fn task_succeeded(&self, _workflow: &Workflow, finished: &FinishedTask) {
        self.record(ExecutionEvent::TaskSucceeded(finished.task().id.clone()));
    }

    fn task_failed(&self, _workflow: &Workflow, finished: &FinishedTask) {
        self.record(ExecutionEvent::TaskFailed(finished.task().id.clone()));
    }

    fn task_reused(&self, _workflow: &Workflow, finished: &FinishedTask) {
        self.record(ExecutionEvent::TaskReused(finished.task().id.clone()));
    }

    fn workflow_succeeded(&self, _workflow: &Workflow) {
        self.record(ExecutionEvent::WorkflowSucceeded);
    }

    fn workflow_failed(&self, _workflow: &Workflow) {
        self.record(ExecutionEvent::WorkflowFailed);
    }
}
