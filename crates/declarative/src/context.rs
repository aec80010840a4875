//! Operation context
//!
//! Carries the caller's cancellation signal and deadline into every remote
//! call. A call that is cancelled or times out fails like any other failed
//! call: the reconciler returns an error and produces no new state.

use crate::error::{ReconcileError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Context passed to every lifecycle operation
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Create a context with no deadline that is never cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context tied to an existing cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Fail operations that have not completed within `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Token that cancels operations running under this context
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every operation running under this context
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a remote call, racing it against cancellation and the deadline
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = call => result,
            () = self.cancel.cancelled() => Err(ReconcileError::Cancelled),
            () = deadline => Err(ReconcileError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = OperationContext::new();
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let ctx = OperationContext::new();
        ctx.cancel();
        let result: Result<()> = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(ReconcileError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_running() {
        let ctx = OperationContext::new();
        let token = ctx.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ReconcileError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = OperationContext::new().with_timeout(Duration::from_secs(1));
        let result: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ReconcileError::DeadlineExceeded)));
    }
}
