use crate::error::ConversionError;
use crate::types::{Execution, PayloadKind, SourceObject, TaskRun};

/// Converts a watched source object into the execution it represents.
///
/// Documents without a `kind` are read as task runs.
///
/// # Errors
/// Returns `ConversionError` for another kind, a document that does not
/// decode as a task run, or one without a name.
pub fn to_execution(object: &SourceObject) -> Result<Execution, ConversionError> {
    match object.kind() {
        None | Some("TaskRun") => {}
        Some(other) => return Err(ConversionError::UnsupportedKind(other.to_string())),
    }

    let task_run: TaskRun =
        serde_json::from_value(object.document().clone()).map_err(|e| {
            ConversionError::Decode {
                kind: PayloadKind::TaskRun.as_str(),
                reason: e.to_string(),
            }
        })?;

    if task_run.metadata.name.is_empty() {
        return Err(ConversionError::MissingField("metadata.name"));
    }
    Ok(Execution::TaskRun(task_run))
}
