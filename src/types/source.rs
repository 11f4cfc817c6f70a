use super::identifiers::ObjectKey;
use serde_json::Value;

/// A watched object as its owner stores it: an untyped JSON document.
///
/// Read-only from this crate's side; changes go through
/// `SourceObjectStore::patch`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceObject(Value);

impl SourceObject {
    #[must_use]
    pub const fn new(document: Value) -> Self {
        Self(document)
    }

    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_document(self) -> Value {
        self.0
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    #[must_use]
    pub fn key(&self) -> Option<ObjectKey> {
        let metadata = self.0.get("metadata")?;
        let name = metadata.get("name").and_then(Value::as_str)?;
        let namespace = metadata
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(ObjectKey::new(namespace, name))
    }
}
