//! Synchronizes watched task runs into results.
//!
//! One [`ResultSyncReconciler::reconcile`] call handles one work-queue key:
//! resolve the source object, convert it, then either create a result and
//! write its name back onto the object, or fold the execution into the
//! result the object already points at.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod context;
mod ports;

pub use context::ReconcileContext;
pub use ports::{PortFuture, ResultsClient, SourceObjectStore};

use crate::annotation::{self, ResultRef};
use crate::convert::to_execution;
use crate::error::{Result, ResultsError};
use crate::types::{Execution, ObjectKey, RunResult};
use tracing::{error, info, info_span, Instrument};

pub const DEFAULT_PARENT: &str = "default";

/// Where an execution landed inside its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSlot {
    Replaced(usize),
    Appended(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The key cannot name an object; nothing was called.
    InvalidKey,
    /// The source object no longer exists; nothing was called.
    Gone,
    Created {
        result: ResultRef,
    },
    Updated {
        result: ResultRef,
        slot: ExecutionSlot,
    },
}

pub struct ResultSyncReconciler<R, S> {
    results: R,
    sources: S,
    parent: Option<String>,
}

impl<R, S> ResultSyncReconciler<R, S>
where
    R: ResultsClient + Sync,
    S: SourceObjectStore + Sync,
{
    /// Results are created under the source object's namespace.
    #[must_use]
    pub const fn new(results: R, sources: S) -> Self {
        Self {
            results,
            sources,
            parent: None,
        }
    }

    /// Creates every result under `parent` instead of the object's namespace.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Reconciles the object behind `key` (`namespace/name`) once.
    ///
    /// # Errors
    /// Returns conversion failures, any results-service or source-store
    /// failure, `ResultsError::PatchApply` when the back-reference cannot be
    /// written after a successful create, and `ResultsError::Cancelled`.
    /// A missing source object is not an error.
    pub async fn reconcile(&self, ctx: &ReconcileContext, key: &str) -> Result<ReconcileOutcome> {
        let Some(key) = ObjectKey::parse(key) else {
            error!(parent: ctx.span(), key, "Invalid resource key");
            return Ok(ReconcileOutcome::InvalidKey);
        };

        let span = info_span!(
            parent: ctx.span(),
            "reconcile",
            namespace = key.namespace(),
            name = key.name()
        );
        self.reconcile_key(ctx, &key).instrument(span).await
    }

    async fn reconcile_key(
        &self,
        ctx: &ReconcileContext,
        key: &ObjectKey,
    ) -> Result<ReconcileOutcome> {
        let Some(object) = ctx.run(self.sources.get(key)).await.inspect_err(|e| {
            error!("Error retrieving source object: {e}");
        })?
        else {
            info!("Source object in work queue no longer exists");
            return Ok(ReconcileOutcome::Gone);
        };

        let execution = to_execution(&object).map_err(|e| {
            error!("Error converting source object to an execution: {e}");
            ResultsError::from(e)
        })?;

        match ResultRef::of(execution.metadata()) {
            None => self.create(ctx, key, execution).await,
            Some(result) => self.update(ctx, result, execution).await,
        }
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        key: &ObjectKey,
        execution: Execution,
    ) -> Result<ReconcileOutcome> {
        let metadata = execution.metadata().clone();
        let request = RunResult::new(self.parent_for(key), vec![execution]);

        let created = ctx
            .run(self.results.create_result(request))
            .await
            .inspect_err(|e| error!("Error creating result: {e}"))?;
        let result = ResultRef::new(created.name());

        // The result exists from here on; a failed patch leaves it without a
        // back-reference and the next pass creates another one.
        let ops = annotation::add_result_id(&metadata, &result);
        ctx.run(self.sources.patch(key, &ops))
            .await
            .map_err(|e| match e {
                ResultsError::Cancelled => ResultsError::Cancelled,
                other => ResultsError::PatchApply {
                    namespace: key.namespace().to_string(),
                    name: key.name().to_string(),
                    reason: other.to_string(),
                },
            })
            .inspect_err(|e| error!(result = %result, "{e}"))?;

        info!(result = %result, "Created a new result");
        Ok(ReconcileOutcome::Created { result })
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        result: ResultRef,
        execution: Execution,
    ) -> Result<ReconcileOutcome> {
        let mut stored = ctx
            .run(self.results.get_result(result.as_str()))
            .await
            .inspect_err(|e| error!(result = %result, "Error retrieving result: {e}"))?;

        let slot = upsert_execution(&mut stored.executions, execution);

        ctx.run(self.results.update_result(result.as_str(), stored))
            .await
            .inspect_err(|e| error!(result = %result, "Error updating result: {e}"))?;

        info!(result = %result, ?slot, "Updated result");
        Ok(ReconcileOutcome::Updated { result, slot })
    }

    fn parent_for(&self, key: &ObjectKey) -> String {
        self.parent.clone().unwrap_or_else(|| {
            if key.namespace().is_empty() {
                DEFAULT_PARENT.to_string()
            } else {
                key.namespace().to_string()
            }
        })
    }
}

/// Replaces every execution converted from the same object as `execution`
/// (matched on its metadata namespace and name), or appends it when none
/// matches.
///
/// Unindexed linear scan: cost grows with the number of executions a result
/// accumulates.
pub fn upsert_execution(executions: &mut Vec<Execution>, execution: Execution) -> ExecutionSlot {
    let identity = execution.metadata().key();
    let mut first = None;
    for (index, slot) in executions.iter_mut().enumerate() {
        if slot.is_for(&identity) {
            *slot = execution.clone();
            first.get_or_insert(index);
        }
    }

    first.map_or_else(
        || {
            executions.push(execution);
            ExecutionSlot::Appended(executions.len() - 1)
        },
        ExecutionSlot::Replaced,
    )
}
