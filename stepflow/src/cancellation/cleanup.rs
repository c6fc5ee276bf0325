//! Scope cleanup utilities.
//!
//! Teardown is always awaited: a scope that requests cleanup without
//! awaiting it is the anti-pattern this module exists to prevent.
//! Callbacks run in LIFO order to unwind resource acquisition.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Type alias for async teardown callbacks.
pub type TeardownCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Stack of teardown callbacks executed in LIFO order at scope exit.
///
/// Each callback runs at most once; the stack is drained by `run_all`.
/// Failures (timeouts) are collected and reported, never thrown, so a
/// cleanup problem cannot mask the scope's primary result.
#[derive(Default)]
pub struct CleanupStack {
    callbacks: Mutex<Vec<(String, TeardownCallback)>>,
}

impl CleanupStack {
    /// Creates a new, empty cleanup stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a teardown callback onto the stack.
    pub fn push<F, Fut>(&self, name: impl Into<String>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let boxed: TeardownCallback = Box::new(move || Box::pin(callback()));
        self.callbacks.lock().push((name, boxed));
    }

    /// Returns the number of pending teardown callbacks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Runs all teardown callbacks in LIFO order.
    ///
    /// Each callback gets an equal share of the total timeout. Returns the
    /// names that completed and the names that failed with a reason. The
    /// stack is empty afterwards.
    pub async fn run_all(&self, timeout_seconds: f64) -> (Vec<String>, Vec<(String, String)>) {
        let callbacks: Vec<_> = {
            let mut lock = self.callbacks.lock();
            std::mem::take(&mut *lock)
        };

        if callbacks.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let per_callback_timeout =
            Duration::from_secs_f64((timeout_seconds / callbacks.len() as f64).max(0.01));

        let mut completed = Vec::new();
        let mut failed = Vec::new();

        // Execute in reverse order (LIFO)
        for (name, callback) in callbacks.into_iter().rev() {
            let fut = callback();
            match timeout(per_callback_timeout, fut).await {
                Ok(()) => {
                    completed.push(name);
                }
                Err(_) => {
                    warn!(callback = %name, "teardown callback timed out");
                    failed.push((name, "Timeout".to_string()));
                }
            }
        }

        (completed, failed)
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field("pending_count", &self.pending_count())
            .finish()
    }
}

/// Runs an operation, then always awaits its teardown.
///
/// The teardown future runs on the success path and the error path alike,
/// bounded by `teardown_timeout`. The operation's result is returned
/// unchanged; a teardown timeout is logged but never replaces it.
pub async fn run_with_teardown<T, F, Fut, C, CFut>(
    operation: F,
    teardown: C,
    teardown_timeout: Duration,
) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = ()>,
{
    let result = operation().await;

    if timeout(teardown_timeout, teardown()).await.is_err() {
        warn!("teardown timed out after {:?}", teardown_timeout);
    }

    result
}

/// Guard that runs a synchronous fallback cleanup when dropped.
///
/// For teardown that must also happen on unwind paths where nothing can be
/// awaited. Disarm it once the async teardown has been awaited properly.
pub struct DisposeGuard {
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl DisposeGuard {
    /// Creates a new dispose guard.
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Disarms the guard, preventing the fallback cleanup from running.
    pub fn disarm(&mut self) {
        self.cleanup = None;
    }
}

impl Drop for DisposeGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}
