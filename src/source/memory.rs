use crate::error::ResultsError;
use crate::patch::{apply_all, PatchOp};
use crate::reconciler::{PortFuture, SourceObjectStore};
use crate::types::{ObjectKey, SourceObject};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process source store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceStore {
    objects: Arc<Mutex<HashMap<ObjectKey, Value>>>,
    patches: Arc<Mutex<Vec<(ObjectKey, Vec<PatchOp>)>>>,
    gets: Arc<Mutex<u32>>,
}

impl MemorySourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the object named by the document's metadata.
    ///
    /// # Errors
    /// Returns `ResultsError::ConfigError` when the document has no name.
    pub async fn insert(&self, document: Value) -> crate::Result<ObjectKey> {
        let key = SourceObject::new(document.clone())
            .key()
            .ok_or_else(|| ResultsError::ConfigError("object has no metadata.name".to_string()))?;
        self.objects.lock().await.insert(key.clone(), document);
        Ok(key)
    }

    pub async fn remove(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().await.remove(key)
    }

    pub async fn document(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().await.get(key).cloned()
    }

    /// Every patch applied so far, in order.
    pub async fn patches(&self) -> Vec<(ObjectKey, Vec<PatchOp>)> {
        self.patches.lock().await.clone()
    }

    pub async fn get_count(&self) -> u32 {
        *self.gets.lock().await
    }
}

impl SourceObjectStore for MemorySourceStore {
    fn get<'a>(&'a self, key: &'a ObjectKey) -> PortFuture<'a, Option<SourceObject>> {
        Box::pin(async move {
            let mut gets = self.gets.lock().await;
            *gets = gets.saturating_add(1);
            drop(gets);
            Ok(self.document(key).await.map(SourceObject::new))
        })
    }

    fn patch<'a>(
        &'a self,
        key: &'a ObjectKey,
        ops: &'a [PatchOp],
    ) -> PortFuture<'a, SourceObject> {
        Box::pin(async move {
            let mut objects = self.objects.lock().await;
            let document = objects
                .get_mut(key)
                .ok_or_else(|| ResultsError::NotFound(format!("source object {key}")))?;

            let mut patched = document.clone();
            apply_all(ops, &mut patched).map_err(|reason| ResultsError::PatchApply {
                namespace: key.namespace().to_string(),
                name: key.name().to_string(),
                reason,
            })?;
            document.clone_from(&patched);
            drop(objects);

            self.patches.lock().await.push((key.clone(), ops.to_vec()));
            Ok(SourceObject::new(patched))
        })
    }
}
