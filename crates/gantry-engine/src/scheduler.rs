//! Workflow scheduling and worker coordination

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gantry_model::{Task, Workflow, WorkflowBuilder};

use crate::error::{EngineError, Result};
use crate::finished::FinishedTask;
use crate::handler::HandlerFactory;
use crate::listener::ExecutionListener;
use crate::storage::TaskStorage;
use crate::throttle::TaskThrottle;
use crate::worker::{TaskExecutor, WorkerEvent};

/// Executes a workflow's task graph to a terminal state
///
/// One executor drives one run. Workers are spawned as dependencies
/// resolve, their reports are applied to the scheduling state one at a
/// time, and the run ends when no task can start and none is in flight.
/// A task whose dependency never succeeds is simply never started; such
/// stragglers make the final verdict a failure.
pub struct WorkflowExecutor {
    storage: Arc<dyn TaskStorage>,
    throttle: Arc<dyn TaskThrottle>,
    factory: Arc<dyn HandlerFactory>,
    listeners: Vec<Arc<dyn ExecutionListener>>,
    /// Snapshot accumulator; every listener notification sees its state
    builder: WorkflowBuilder,
    /// Tasks not yet eligible to start, in workflow order
    new_tasks: Vec<Arc<Task>>,
    /// Ids of tasks whose workers are in flight
    pending: HashSet<String>,
    /// Successfully finished tasks by id; membership makes dependents
    /// eligible
    finished: HashMap<String, FinishedTask>,
}

impl WorkflowExecutor {
    /// Create an executor for the given workflow
    ///
    /// Scheduling starts from the workflow's task list; any results the
    /// workflow already carries are ignored, since reuse of earlier runs
    /// flows through the on-disk cache instead.
    pub fn new(
        workflow: &Workflow,
        factory: Arc<dyn HandlerFactory>,
        storage: Arc<dyn TaskStorage>,
        throttle: Arc<dyn TaskThrottle>,
    ) -> Self {
        let mut builder = WorkflowBuilder::new();
        let mut new_tasks = Vec::with_capacity(workflow.tasks.len());
        for task in &workflow.tasks {
            builder.add_task(task.clone());
            new_tasks.push(Arc::new(task.clone()));
        }
        Self {
            storage,
            throttle,
            factory,
            listeners: Vec::new(),
            builder,
            new_tasks,
            pending: HashSet::new(),
            finished: HashMap::new(),
        }
    }

    /// Register a listener for lifecycle events
    pub fn add_listener(&mut self, listener: Arc<dyn ExecutionListener>) {
        self.listeners.push(listener);
    }

    /// Run the workflow to a terminal state
    ///
    /// Returns the final workflow snapshot whether or not the run as a
    /// whole succeeded, so partial progress is always visible. An `Err`
    /// is returned only for fatal conditions: an unsupported handler
    /// reference, or a result document that could not be persisted or
    /// read back. Every spawned worker is joined before this returns.
    pub async fn execute(mut self) -> Result<Workflow> {
        info!(tasks = self.new_tasks.len(), "executing workflow");
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut workers: Vec<JoinHandle<()>> = Vec::new();
        let mut fatal: Option<EngineError> = None;

        self.notify(|listener, workflow| listener.workflow_running(workflow));

        loop {
            // Launch everything currently eligible, rescanning from the
            // front after each launch so a freshly launched task never
            // delays the eligibility check of the ones after it.
            while let Some(position) = self
                .new_tasks
                .iter()
                .position(|task| self.dependencies_finished(task))
            {
                let task = self.new_tasks.remove(position);
                workers.push(self.launch(task, &events_tx));
            }

            if self.pending.is_empty() {
                break;
            }

            let Some(event) = events_rx.recv().await else {
                break;
            };
            if let Some(error) = self.apply(event) {
                fatal = Some(error);
                break;
            }
        }

        if let Some(error) = fatal {
            warn!(error = %error, "aborting workflow");
            join_workers(workers).await;
            return Err(error);
        }

        let succeeded = self.new_tasks.is_empty();
        let workflow = self.builder.build();
        if succeeded {
            info!(results = workflow.results.len(), "workflow succeeded");
            for listener in &self.listeners {
                listener.workflow_succeeded(&workflow);
            }
        } else {
            let blocked: Vec<&str> = self.new_tasks.iter().map(|task| task.id.as_str()).collect();
            warn!(?blocked, "workflow failed; some tasks never became eligible");
            for listener in &self.listeners {
                listener.workflow_failed(&workflow);
            }
        }

        join_workers(workers).await;
        Ok(workflow)
    }

    /// Whether every dependency id is in the successfully-finished set
    fn dependencies_finished(&self, task: &Task) -> bool {
        task.dependencies
            .iter()
            .all(|id| self.finished.contains_key(id))
    }

    /// Spawn a worker bound to this task and its resolved dependencies
    fn launch(&mut self, task: Arc<Task>, events: &UnboundedSender<WorkerEvent>) -> JoinHandle<()> {
        let dependencies: Vec<FinishedTask> = task
            .dependencies
            .iter()
            .filter_map(|id| self.finished.get(id).cloned())
            .collect();
        debug!(task = %task.id, dependencies = dependencies.len(), "launching task");
        self.pending.insert(task.id.clone());
        let worker = TaskExecutor::new(
            task,
            dependencies,
            self.storage.as_ref(),
            self.throttle.clone(),
            self.factory.clone(),
            events.clone(),
        );
        tokio::spawn(worker.run())
    }

    /// Apply one worker report to the scheduling state and notify
    /// listeners; returns the error if the run must abort
    fn apply(&mut self, event: WorkerEvent) -> Option<EngineError> {
        match event {
            WorkerEvent::Running(task) => {
                self.notify(|listener, workflow| listener.task_running(workflow, &task));
                None
            }
            WorkerEvent::Finished(finished) => {
                self.pending.remove(&finished.task().id);
                self.builder.add_result(finished.result().clone());
                if finished.result().outcome.is_success() {
                    self.finished
                        .insert(finished.task().id.clone(), finished.clone());
                    self.notify(|listener, workflow| listener.task_succeeded(workflow, &finished));
                } else {
                    debug!(
                        task = %finished.task().id,
                        outcome = %finished.result().outcome,
                        "task did not succeed"
                    );
                    self.notify(|listener, workflow| listener.task_failed(workflow, &finished));
                }
                None
            }
            WorkerEvent::Reused(finished) => {
                self.pending.remove(&finished.task().id);
                self.builder.add_result(finished.result().clone());
                self.finished
                    .insert(finished.task().id.clone(), finished.clone());
                self.notify(|listener, workflow| listener.task_reused(workflow, &finished));
                None
            }
            WorkerEvent::Fatal { task, error } => {
                self.pending.remove(&task.id);
                Some(error)
            }
        }
    }

    /// Notify all listeners with a snapshot of the current workflow state
    fn notify(&self, event: impl Fn(&dyn ExecutionListener, &Workflow)) {
        let workflow = self.builder.build();
        for listener in &self.listeners {
            event(listener.as_ref(), &workflow);
        }
    }
}

/// Wait for every spawned worker to exit
async fn join_workers(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        if let Err(err) = worker.await {
            warn!(error = %err, "worker task aborted");
        }
    }
}
