use super::execution::Execution;
use crate::name::format_result_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate of related executions, addressed as `parent/results/id`.
///
/// `etag` is empty until the result has been stored; a non-empty etag on an
/// update request is checked against the stored one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub parent: String,
    pub id: String,
    pub executions: Vec<Execution>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RunResult {
    /// A not-yet-stored result under `parent`; the store assigns the id.
    #[must_use]
    pub fn new(parent: impl Into<String>, executions: Vec<Execution>) -> Self {
        Self {
            parent: parent.into(),
            executions,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        format_result_name(&self.parent, &self.id)
    }
}
