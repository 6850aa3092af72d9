//! Task results and outcomes

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::ModelError;

/// Content-derived identity of one task execution
///
/// Computed over the task's handler, its parameters, and the identities of
/// its dependency results, so the identity is transitively sensitive to the
/// whole upstream subgraph. Doubles as the cache key and as the storage
/// address of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultId(pub String);

impl ResultId {
    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal outcome of one task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The handler completed its work
    Success,
    /// The handler determined the work did not succeed
    Failure,
    /// An infrastructure or precondition problem prevented the work
    Error,
}

impl TaskOutcome {
    /// Check if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// The recorded outcome of one task execution
///
/// Built by a worker once its task reaches a terminal state, and persisted
/// into the result directory when the outcome is a success. Immutable once
/// built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Content-derived identity of this execution
    pub id: ResultId,
    /// Id of the task this result belongs to
    pub task_id: String,
    /// Artifacts declared by the handler
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Terminal outcome
    pub outcome: TaskOutcome,
    /// Human-readable reason for the outcome
    pub outcome_reason: String,
    /// When handler execution started
    pub time_started: DateTime<Utc>,
    /// When handler execution finished
    pub time_finished: DateTime<Utc>,
}

impl TaskResult {
    /// Create a new result record
    pub fn new(
        id: ResultId,
        task_id: impl Into<String>,
        artifacts: Vec<Artifact>,
        outcome: TaskOutcome,
        outcome_reason: impl Into<String>,
        time_started: DateTime<Utc>,
        time_finished: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id: task_id.into(),
            artifacts,
            outcome,
            outcome_reason: outcome_reason.into(),
            time_started,
            time_finished,
        }
    }

    /// Serialize to a pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}
