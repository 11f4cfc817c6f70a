use crate::patch::PatchOp;
use crate::types::{ObjectKey, RunResult, SourceObject};
use crate::Result;
use std::future::Future;
use std::pin::Pin;

pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Results service consumed by the reconciler.
pub trait ResultsClient {
    /// Stores a new result and returns it with its assigned id and etag.
    fn create_result(&self, result: RunResult) -> PortFuture<'_, RunResult>;

    /// Fails with `ResultsError::NotFound` when no result has `name`.
    fn get_result<'a>(&'a self, name: &'a str) -> PortFuture<'a, RunResult>;

    /// Replaces the whole result. A non-empty `result.etag` must match the
    /// stored one, otherwise `ResultsError::Conflict`.
    fn update_result<'a>(&'a self, name: &'a str, result: RunResult)
        -> PortFuture<'a, RunResult>;
}

/// Store owning the watched source objects.
pub trait SourceObjectStore {
    /// `Ok(None)` when the object does not exist.
    fn get<'a>(&'a self, key: &'a ObjectKey) -> PortFuture<'a, Option<SourceObject>>;

    fn patch<'a>(&'a self, key: &'a ObjectKey, ops: &'a [PatchOp])
        -> PortFuture<'a, SourceObject>;
}
