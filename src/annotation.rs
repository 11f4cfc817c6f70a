//! Back-reference annotation linking a source object to its result.

use crate::patch::{escape, PatchOp};
use crate::types::ObjectMeta;
use serde_json::{Map, Value};
use std::fmt;

pub const RESULT_ID: &str = "results.tekton.dev/id";

/// Weak reference from a source object to the result that indexes it. A
/// lookup key only; it implies no ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultRef(String);

impl ResultRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn of(metadata: &ObjectMeta) -> Option<Self> {
        metadata.annotation(RESULT_ID).map(Self::new)
    }
}

impl fmt::Display for ResultRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Smallest patch that records `result` on an object with `metadata`.
///
/// Objects without annotations get the whole map so the `add` has a parent.
#[must_use]
pub fn add_result_id(metadata: &ObjectMeta, result: &ResultRef) -> Vec<PatchOp> {
    if metadata.annotations.is_empty() {
        let mut annotations = Map::new();
        annotations.insert(RESULT_ID.to_string(), Value::from(result.as_str()));
        vec![PatchOp::add("/metadata/annotations", annotations)]
    } else {
        vec![PatchOp::add(
            format!("/metadata/annotations/{}", escape(RESULT_ID)),
            result.as_str(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::{add_result_id, ResultRef, RESULT_ID};
    use crate::patch::apply_all;
    use crate::types::ObjectMeta;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn reads_reference_from_annotations() {
        let metadata = ObjectMeta {
            annotations: BTreeMap::from([(RESULT_ID.to_string(), "ns/results/1".to_string())]),
            ..ObjectMeta::default()
        };
        assert_eq!(ResultRef::of(&metadata), Some(ResultRef::new("ns/results/1")));
        assert_eq!(ResultRef::of(&ObjectMeta::default()), None);
    }

    #[test]
    fn patch_adds_single_escaped_key_when_annotations_exist() -> Result<(), String> {
        let metadata = ObjectMeta {
            annotations: BTreeMap::from([("owner".to_string(), "ci".to_string())]),
            ..ObjectMeta::default()
        };
        let ops = add_result_id(&metadata, &ResultRef::new("ns/results/1"));
        assert_eq!(ops.len(), 1);

        let mut doc = json!({"metadata": {"annotations": {"owner": "ci"}}});
        apply_all(&ops, &mut doc)?;
        assert_eq!(doc["metadata"]["annotations"][RESULT_ID], "ns/results/1");
        assert_eq!(doc["metadata"]["annotations"]["owner"], "ci");
        Ok(())
    }

    #[test]
    fn patch_creates_annotation_map_when_absent() -> Result<(), String> {
        let ops = add_result_id(&ObjectMeta::default(), &ResultRef::new("ns/results/1"));
        let mut doc = json!({"metadata": {"name": "tr"}});
        apply_all(&ops, &mut doc)?;
        assert_eq!(
            doc["metadata"],
            json!({"name": "tr", "annotations": {RESULT_ID: "ns/results/1"}})
        );
        Ok(())
    }
}
