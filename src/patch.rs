//! Minimal JSON Patch (RFC 6902) operations applied to source objects.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
}

impl PatchOp {
    #[must_use]
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Applies the operation to `document`.
    ///
    /// # Errors
    /// Returns a description of the failure when the target's parent does not
    /// exist or is not an object.
    pub fn apply(&self, document: &mut Value) -> Result<(), String> {
        match self {
            Self::Add { path, value } => {
                if path.is_empty() {
                    *document = value.clone();
                    return Ok(());
                }
                let (parent, last) = path
                    .rsplit_once('/')
                    .ok_or_else(|| format!("invalid JSON pointer {path:?}"))?;
                let target = document
                    .pointer_mut(parent)
                    .ok_or_else(|| format!("path {parent:?} does not exist"))?;
                let object = target
                    .as_object_mut()
                    .ok_or_else(|| format!("path {parent:?} is not an object"))?;
                object.insert(unescape(last), value.clone());
                Ok(())
            }
        }
    }
}

/// Applies every operation in order, stopping at the first failure.
///
/// # Errors
/// Returns the first operation's failure description.
pub fn apply_all(ops: &[PatchOp], document: &mut Value) -> Result<(), String> {
    ops.iter().try_for_each(|op| op.apply(document))
}

/// Escapes a single reference token (`~` → `~0`, `/` → `~1`).
#[must_use]
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
