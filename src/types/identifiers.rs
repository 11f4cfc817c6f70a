use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a watched source object: `(namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    namespace: String,
    name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Splits a work-queue key of the form `namespace/name` or `name`.
    ///
    /// Returns `None` when the key has more than one separator or an empty name.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split('/');
        let key = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => Self::new("", name),
            (Some(namespace), Some(name), None) => Self::new(namespace, name),
            _ => return None,
        };
        (!key.name.is_empty()).then_some(key)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectKey;

    #[test]
    fn parses_namespaced_and_cluster_keys() {
        assert_eq!(
            ObjectKey::parse("default/build-1"),
            Some(ObjectKey::new("default", "build-1"))
        );
        assert_eq!(ObjectKey::parse("build-1"), Some(ObjectKey::new("", "build-1")));
    }

    #[test]
    fn rejects_keys_that_cannot_name_an_object() {
        assert_eq!(ObjectKey::parse("a/b/c"), None);
        assert_eq!(ObjectKey::parse("default/"), None);
        assert_eq!(ObjectKey::parse(""), None);
    }

    #[test]
    fn display_matches_the_work_queue_key() {
        assert_eq!(ObjectKey::new("ns", "tr").to_string(), "ns/tr");
        assert_eq!(ObjectKey::new("", "tr").to_string(), "tr");
    }
}
