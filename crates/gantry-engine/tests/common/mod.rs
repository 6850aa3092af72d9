//! Shared handlers, throttles, and fixtures for the integration suite

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::fs;

use gantry_engine::{
    CollectingListener, DirectoryStorage, ExecutionEvent, HandlerRegistry, Result,
    SemaphoreThrottle, Task, TaskContext, TaskHandler, TaskThrottle, Termination, Workflow,
    WorkflowExecutor,
};

/// Shared invocation counter threaded through handler constructors
pub type Invocations = Arc<AtomicUsize>;

pub fn counter() -> Invocations {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(invocations: &Invocations) -> usize {
    invocations.load(Ordering::SeqCst)
}

/// Storage root plus the boilerplate of wiring up and running an executor
pub struct Rig {
    pub temp: TempDir,
    pub storage: Arc<DirectoryStorage>,
}

impl Rig {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(DirectoryStorage::new(temp.path()));
        Self { temp, storage }
    }

    /// Execute the workflow and return the final snapshot plus the events
    /// observed by a collecting listener.
    pub async fn run(
        &self,
        workflow: &Workflow,
        registry: HandlerRegistry,
    ) -> Result<(Workflow, Vec<ExecutionEvent>)> {
        self.run_with_throttle(workflow, registry, Arc::new(SemaphoreThrottle::new(4)))
            .await
    }

    pub async fn run_with_throttle(
        &self,
        workflow: &Workflow,
        registry: HandlerRegistry,
        throttle: Arc<dyn TaskThrottle>,
    ) -> Result<(Workflow, Vec<ExecutionEvent>)> {
        let listener = Arc::new(CollectingListener::default());
        let mut executor = WorkflowExecutor::new(
            workflow,
            Arc::new(registry),
            self.storage.clone(),
            throttle,
        );
        executor.add_listener(listener.clone());
        let finished = executor.execute().await?;
        Ok((finished, listener.events()))
    }

    /// The single result directory recorded for a task so far
    pub fn result_dir_of(&self, task_id: &str) -> PathBuf {
        let parent = self.temp.path().join("results").join(task_id);
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&parent)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(
            entries.len(),
            1,
            "expected exactly one result dir for task {}",
            task_id
        );
        entries.remove(0)
    }

    /// Per-attempt work directories still present under the storage root
    pub fn leftover_work_dirs(&self) -> Vec<PathBuf> {
        let root = self.temp.path().join("work");
        let mut leftovers = Vec::new();
        let Ok(tasks) = std::fs::read_dir(&root) else {
            return leftovers;
        };
        for task in tasks.flatten() {
            if let Ok(attempts) = std::fs::read_dir(task.path()) {
                leftovers.extend(attempts.flatten().map(|attempt| attempt.path()));
            }
        }
        leftovers
    }
}

pub fn position_of(events: &[ExecutionEvent], wanted: &ExecutionEvent) -> usize {
    events
        .iter()
        .position(|event| event == wanted)
        .unwrap_or_else(|| panic!("event {:?} not observed in {:?}", wanted, events))
}

/// Writes one artifact file into the result directory and succeeds
pub struct ProducerHandler {
    pub kind: String,
    pub name: String,
    pub content: String,
    pub invocations: Invocations,
}

#[async_trait]
impl TaskHandler for ProducerHandler {
    async fn handle(&self, context: &mut TaskContext) -> Result<Termination> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let path = context.add_artifact(self.kind.clone(), self.name.clone());
        fs::write(&path, self.content.as_bytes()).await?;
        Ok(Termination::success("artifact written"))
    }
}

/// Reads exactly one dependency artifact of a given type and succeeds
pub struct ConsumerHandler {
    pub kind: String,
    pub invocations: Invocations,
}

#[async_trait]
impl TaskHandler for ConsumerHandler {
    async fn handle(&self, context: &mut TaskContext) -> Result<Termination> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let path = context.dependency_artifact(&self.kind)?;
        let content = fs::read_to_string(&path).await?;
        Ok(Termination::success(format!("consumed {}", content)))
    }
}

/// Reports a fixed termination without doing any work
pub struct OutcomeHandler {
    pub termination: Termination,
    pub invocations: Invocations,
}

#[async_trait]
impl TaskHandler for OutcomeHandler {
    async fn handle(&self, _context: &mut TaskContext) -> Result<Termination> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.termination.clone())
    }
}

/// Panics instead of reporting an outcome
pub struct PanickingHandler;

#[async_trait]
impl TaskHandler for PanickingHandler {
    async fn handle(&self, _context: &mut TaskContext) -> Result<Termination> {
        panic!("handler blew up");
    }
}

pub fn register_producer(
    registry: &mut HandlerRegistry,
    handler: &str,
    kind: &str,
    name: &str,
    content: &str,
    invocations: &Invocations,
) {
    let (kind, name, content) = (kind.to_string(), name.to_string(), content.to_string());
    let invocations = invocations.clone();
    registry.register(handler, move |_task| {
        Box::new(ProducerHandler {
            kind: kind.clone(),
            name: name.clone(),
            content: content.clone(),
            invocations: invocations.clone(),
        })
    });
}

pub fn register_consumer(
    registry: &mut HandlerRegistry,
    handler: &str,
    kind: &str,
    invocations: &Invocations,
) {
    let kind = kind.to_string();
    let invocations = invocations.clone();
    registry.register(handler, move |_task| {
        Box::new(ConsumerHandler {
            kind: kind.clone(),
            invocations: invocations.clone(),
        })
    });
}

pub fn register_outcome(
    registry: &mut HandlerRegistry,
    handler: &str,
    termination: Termination,
    invocations: &Invocations,
) {
    let invocations = invocations.clone();
    registry.register(handler, move |_task| {
        Box::new(OutcomeHandler {
            termination: termination.clone(),
            invocations: invocations.clone(),
        })
    });
}

pub fn register_noop(registry: &mut HandlerRegistry, handler: &str, invocations: &Invocations) {
    register_outcome(registry, handler, Termination::success("done"), invocations);
}

/// Throttle that counts acquires and releases around a semaphore
pub struct CountingThrottle {
    inner: SemaphoreThrottle,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl CountingThrottle {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: SemaphoreThrottle::new(capacity),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskThrottle for CountingThrottle {
    async fn acquire_capacity(&self, task: &Task) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire_capacity(task).await;
    }

    fn release_capacity(&self, task: &Task) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release_capacity(task);
    }
}
