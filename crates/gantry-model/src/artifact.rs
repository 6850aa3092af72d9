//! Artifact declarations

use serde::{Deserialize, Serialize};

/// A named, typed output file declared by a task during execution
///
/// The name doubles as the relative filename under the task's result
/// directory and must be unique within one task's result. The type is what
/// dependent tasks select artifacts by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact type
    #[serde(rename = "type")]
    pub kind: String,
    /// File name relative to the result directory
    pub name: String,
}

impl Artifact {
    /// Create a new artifact declaration
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}
