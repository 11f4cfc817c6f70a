use crate::error::{Result, ResultsError};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Per-invocation context: the span reconciliation logs under and the token
/// that cancels it.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    span: Span,
    cancel: CancellationToken,
}

impl ReconcileContext {
    #[must_use]
    pub const fn new(span: Span, cancel: CancellationToken) -> Self {
        Self { span, cancel }
    }

    /// Context under the current span that is never cancelled.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Span::current(), CancellationToken::new())
    }

    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `call` unless the context is cancelled first.
    ///
    /// # Errors
    /// Returns `ResultsError::Cancelled` on cancellation, otherwise the call's
    /// own result.
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ResultsError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ResultsError::Cancelled),
            result = call => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReconcileContext;
    use crate::error::ResultsError;
    use tokio_util::sync::CancellationToken;
    use tracing::Span;

    #[tokio::test]
    async fn run_passes_through_when_not_cancelled() {
        let ctx = ReconcileContext::current();
        let value = ctx.run(async { Ok(7) }).await;
        assert!(matches!(value, Ok(7)));
    }

    #[tokio::test]
    async fn run_short_circuits_once_cancelled() {
        let token = CancellationToken::new();
        let ctx = ReconcileContext::new(Span::none(), token.clone());
        token.cancel();

        let value = ctx.run(async { Ok(7) }).await;
        assert!(matches!(value, Err(ResultsError::Cancelled)));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_call() {
        let token = CancellationToken::new();
        let ctx = ReconcileContext::new(Span::none(), token.clone());

        let pending = ctx.run(std::future::pending::<crate::Result<()>>());
        token.cancel();
        assert!(matches!(pending.await, Err(ResultsError::Cancelled)));
    }
}
