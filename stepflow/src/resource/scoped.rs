//! Resource wrapper with idempotent, awaitable teardown.

use super::state::DisposalState;
use crate::cancellation::CancelToken;
use crate::errors::StepflowError;
use async_trait::async_trait;
use tracing::debug;

/// Asynchronous teardown for an underlying resource.
#[async_trait]
pub trait Teardown: Send {
    /// Releases the underlying resource.
    ///
    /// Runs at most once per resource; the wrapper guarantees later disposal
    /// requests never reach it. Teardown must not fail the caller, so
    /// problems are logged by the implementation rather than returned.
    async fn teardown(&mut self);
}

/// The unit of work a resource performs while open.
#[async_trait]
pub trait Operate<I: Send + 'static>: Send {
    /// Output of one operation.
    type Output: Send;

    /// Performs one operation against the open resource.
    async fn operate(&mut self, input: I) -> anyhow::Result<Self::Output>;
}

/// Wrapper guaranteeing idempotent, awaitable teardown of `R`.
///
/// The `Open -> Disposed` transition is an atomic compare-and-set, so two
/// simultaneous `dispose` calls produce exactly one real teardown and two
/// successful completions. The inner resource sits behind an async-aware
/// mutex; waiting for it suspends the task instead of blocking a worker
/// thread, so a lock held across an await cannot stall the pool.
pub struct CancellableResource<R> {
    name: String,
    state: DisposalState,
    inner: tokio::sync::Mutex<Option<R>>,
}

impl<R: Teardown> CancellableResource<R> {
    /// Wraps `inner`, starting in the `Open` state.
    #[must_use]
    pub fn open(name: impl Into<String>, inner: R) -> Self {
        Self {
            name: name.into(),
            state: DisposalState::open(),
            inner: tokio::sync::Mutex::new(Some(inner)),
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the resource has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    /// Performs one operation against the inner resource.
    ///
    /// Fails with [`StepflowError::ResourceDisposed`] once disposed, and
    /// checks the cancellation token before any work starts. An operation
    /// failure surfaces as [`StepflowError::StepFailed`] with the original
    /// cause preserved.
    pub async fn operate<I>(&self, input: I, token: &CancelToken) -> Result<R::Output, StepflowError>
    where
        R: Operate<I>,
        I: Send + 'static,
    {
        if self.state.is_disposed() {
            return Err(self.disposed_error());
        }
        token.checkpoint()?;

        let mut guard = self.inner.lock().await;
        // Disposal may have won the race while we waited for the lock.
        let Some(inner) = guard.as_mut() else {
            return Err(self.disposed_error());
        };

        inner
            .operate(input)
            .await
            .map_err(|source| StepflowError::StepFailed {
                step: self.name.clone(),
                source,
            })
    }

    /// Transitions `Open -> Disposed` and tears down the inner resource.
    ///
    /// Exactly one caller performs the teardown; every other call, including
    /// concurrent ones, completes successfully with no further effect. The
    /// returned future must be awaited - disposal is never fire-and-forget.
    pub async fn dispose(&self) {
        if !self.state.begin_dispose() {
            return;
        }

        debug!(resource = %self.name, "disposing");
        let inner = self.inner.lock().await.take();
        if let Some(mut inner) = inner {
            inner.teardown().await;
        }
    }

    fn disposed_error(&self) -> StepflowError {
        StepflowError::ResourceDisposed {
            resource: self.name.clone(),
        }
    }
}

impl<R> std::fmt::Debug for CancellableResource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellableResource")
            .field("name", &self.name)
            .field("disposed", &self.state.is_disposed())
            .finish()
    }
}

/// Runs one operation against the resource, then always awaits disposal.
///
/// Disposal runs on the error path too, so the scope never exits with the
/// resource still open. This is the supported shape for one-shot resource
/// use; requesting disposal without awaiting it is the anti-pattern this
/// helper exists to prevent.
pub async fn using<R, I>(
    resource: CancellableResource<R>,
    input: I,
    token: &CancelToken,
) -> Result<R::Output, StepflowError>
where
    R: Teardown + Operate<I>,
    I: Send + 'static,
{
    let result = resource.operate(input, token).await;
    resource.dispose().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TeardownProbe;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_operate_while_open() {
        let probe = TeardownProbe::new();
        let resource = CancellableResource::open("probe", probe);
        let token = CancelToken::new();

        let echoed = resource.operate(7, &token).await.expect("operate succeeds");
        assert_eq!(echoed, 7);
    }

    #[tokio::test]
    async fn test_operate_checks_cancellation_first() {
        let probe = TeardownProbe::new();
        let operations = probe.operations();
        let resource = CancellableResource::open("probe", probe);
        let token = CancelToken::new();
        token.cancel("stop");

        let err = resource.operate(7, &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(operations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_operate_after_dispose_is_rejected() {
        let probe = TeardownProbe::new();
        let operations = probe.operations();
        let resource = CancellableResource::open("probe", probe);
        let token = CancelToken::new();

        resource.dispose().await;

        let err = resource.operate(7, &token).await.unwrap_err();
        assert!(err.is_disposed());
        assert_eq!(err.to_string(), "resource 'probe' is disposed");
        assert_eq!(operations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let probe = TeardownProbe::new();
        let teardowns = probe.teardowns();
        let resource = CancellableResource::open("probe", probe);

        for _ in 0..4 {
            resource.dispose().await;
        }

        assert!(resource.is_disposed());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_dispose_single_teardown() {
        let probe = TeardownProbe::new();
        let teardowns = probe.teardowns();
        let resource = Arc::new(CancellableResource::open("probe", probe));

        let a = {
            let resource = resource.clone();
            tokio::spawn(async move { resource.dispose().await })
        };
        let b = {
            let resource = resource.clone();
            tokio::spawn(async move { resource.dispose().await })
        };

        let (a, b) = futures::future::join(a, b).await;
        a.expect("first dispose completes");
        b.expect("second dispose completes");

        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operate_losing_the_lock_race_to_dispose_is_rejected() {
        let probe = TeardownProbe::new();
        let operations = probe.operations();
        let teardowns = probe.teardowns();
        let resource = Arc::new(CancellableResource::open("probe", probe));

        // Hold the inner lock so the operation passes its open check and
        // then queues behind disposal.
        let mut guard = resource.inner.lock().await;

        let late_operate = {
            let resource = resource.clone();
            tokio::spawn(async move {
                let token = CancelToken::new();
                resource.operate(7, &token).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Disposal wins the race: the flag flips and the inner value is
        // torn down before the queued operation reaches the lock.
        assert!(resource.state.begin_dispose());
        let mut inner = guard.take().expect("inner still present");
        inner.teardown().await;
        drop(guard);

        let err = late_operate.await.expect("task joins").unwrap_err();
        assert!(err.is_disposed());
        assert_eq!(err.to_string(), "resource 'probe' is disposed");
        assert_eq!(operations.load(Ordering::SeqCst), 0);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operation_failure_preserves_cause() {
        let probe = TeardownProbe::failing("injected teardown-probe failure");
        let resource = CancellableResource::open("probe", probe);
        let token = CancelToken::new();

        let err = resource.operate(7, &token).await.unwrap_err();

        let StepflowError::StepFailed { step, source } = &err else {
            panic!("expected step failure, got {err}");
        };
        assert_eq!(step, "probe");
        assert_eq!(source.to_string(), "injected teardown-probe failure");
    }

    #[tokio::test]
    async fn test_using_disposes_on_success() {
        let probe = TeardownProbe::new();
        let teardowns = probe.teardowns();
        let token = CancelToken::new();

        let echoed = using(CancellableResource::open("probe", probe), 3, &token)
            .await
            .expect("operation succeeds");

        assert_eq!(echoed, 3);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_using_disposes_on_error() {
        let probe = TeardownProbe::failing("boom");
        let teardowns = probe.teardowns();
        let token = CancelToken::new();

        let result = using(CancellableResource::open("probe", probe), 3, &token).await;

        assert!(result.is_err());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }
}
