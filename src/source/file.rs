use crate::error::{Result, ResultsError};
use crate::patch::{apply_all, PatchOp};
use crate::reconciler::{PortFuture, SourceObjectStore};
use crate::types::{ObjectKey, SourceObject};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source objects kept as JSON documents at `<root>/<namespace>/<name>.json`
/// (`<root>/<name>.json` for cluster-scoped objects).
#[derive(Debug, Clone)]
pub struct FileSourceStore {
    root: PathBuf,
}

impl FileSourceStore {
    /// # Errors
    /// Returns `ResultsError::ConfigError` if `root` is not a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ResultsError::ConfigError(format!(
                "Source directory does not exist: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// # Errors
    /// Returns `ResultsError::ConfigError` for segments that would escape the root.
    pub fn path_for(&self, key: &ObjectKey) -> Result<PathBuf> {
        let valid = |segment: &str| !segment.starts_with('.') && !segment.contains(['/', '\\']);
        if !valid(key.name()) || (!key.namespace().is_empty() && !valid(key.namespace())) {
            return Err(ResultsError::ConfigError(format!("Invalid object key: {key}")));
        }

        let dir = if key.namespace().is_empty() {
            self.root.clone()
        } else {
            self.root.join(key.namespace())
        };
        Ok(dir.join(format!("{}.json", key.name())))
    }

    async fn read(&self, key: &ObjectKey) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No source object at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(ResultsError::IoError(e)),
        }
    }

    async fn write(&self, key: &ObjectKey, document: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

impl SourceObjectStore for FileSourceStore {
    fn get<'a>(&'a self, key: &'a ObjectKey) -> PortFuture<'a, Option<SourceObject>> {
        Box::pin(async move {
            let Some(mut document) = self.read(key).await? else {
                return Ok(None);
            };
            align_identity(key, &mut document)?;
            Ok(Some(SourceObject::new(document)))
        })
    }

    fn patch<'a>(
        &'a self,
        key: &'a ObjectKey,
        ops: &'a [PatchOp],
    ) -> PortFuture<'a, SourceObject> {
        Box::pin(async move {
            let mut document = self
                .read(key)
                .await?
                .ok_or_else(|| ResultsError::NotFound(format!("source object {key}")))?;
            apply_all(ops, &mut document).map_err(|reason| ResultsError::PatchApply {
                namespace: key.namespace().to_string(),
                name: key.name().to_string(),
                reason,
            })?;
            self.write(key, &document).await?;
            Ok(SourceObject::new(document))
        })
    }
}

/// Makes the document's `metadata.namespace`/`metadata.name` agree with the
/// path it was read from. Missing fields are filled from the key; a field
/// naming a different object is rejected.
fn align_identity(key: &ObjectKey, document: &mut Value) -> Result<()> {
    let Some(metadata) = document.get_mut("metadata").and_then(Value::as_object_mut) else {
        return Ok(());
    };

    for (field, expected) in [("namespace", key.namespace()), ("name", key.name())] {
        let current = metadata.get(field).and_then(Value::as_str).map(str::to_string);
        match current.as_deref() {
            Some(found) if found == expected => {}
            None | Some("") => {
                if !expected.is_empty() {
                    metadata.insert(field.to_string(), Value::String(expected.to_string()));
                }
            }
            Some(found) => {
                return Err(ResultsError::ConfigError(format!(
                    "Source object at {key} declares {field} {found:?}"
                )));
            }
        }
    }
    Ok(())
}
