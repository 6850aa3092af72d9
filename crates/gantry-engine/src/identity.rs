//! Content-derived result identity

use sha2::{Digest, Sha256};

use gantry_model::{ResultId, Task};

use crate::finished::FinishedTask;

/// Separator octet hashed between adjacent fields so field boundaries
/// cannot alias (handler "ab" + parameter "c" must not hash like
/// handler "a" + parameter "bc").
const FIELD_SEPARATOR: [u8; 1] = [0x80];

/// Compute the result identity of a task given its finished dependencies
///
/// The digest covers the handler reference, every parameter name and value
/// in declared order, and each dependency's own result identity in
/// dependency-list order. Because dependency identities are themselves
/// computed this way, the identity is transitively sensitive to the whole
/// upstream subgraph: changing an ancestor's handler or parameters changes
/// every descendant's identity. The task id is deliberately not included;
/// storage keys results by (task id, identity).
pub(crate) fn compute_result_id(task: &Task, dependencies: &[FinishedTask]) -> ResultId {
    let mut hasher = Sha256::new();

    hasher.update(task.handler.as_bytes());
    hasher.update(FIELD_SEPARATOR);

    for parameter in &task.parameters {
        hasher.update(parameter.name.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(parameter.value.as_bytes());
        hasher.update(FIELD_SEPARATOR);
    }

    for dependency in dependencies {
        hasher.update(dependency.result().id.as_str().as_bytes());
        hasher.update(FIELD_SEPARATOR);
    }

    // Two digits per byte keeps the identity at a constant 64 characters
    // regardless of leading zero bytes.
    let mut hex = String::with_capacity(64);
    for byte in hasher.finalize() {
        hex.push_str(&format!("{:02X}", byte));
    }
    ResultId(hex)
}
