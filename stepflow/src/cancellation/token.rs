//! Cancellation token for cooperative cancellation.

use crate::errors::StepflowError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registrations {
    /// The reason for cancellation (first one wins).
    reason: Option<String>,
    /// Callbacks not yet fired; drained by the winning `cancel`.
    callbacks: Vec<CancelCallback>,
}

#[derive(Default)]
struct TokenState {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// Reason and pending callbacks share one lock: the flag transition,
    /// the reason write, and the callback drain happen in a single critical
    /// section, and `on_cancel` decides push-vs-fire under the same lock.
    /// Otherwise a callback registered concurrently with `cancel` could
    /// land after the drain and never fire.
    registrations: Mutex<Registrations>,
}

fn invoke<F: Fn() + ?Sized>(callback: &F) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

/// A shared token for cooperative cancellation.
///
/// Clones share the same underlying state, so a token handed to a step or a
/// resource operation observes cancellation requested anywhere else.
/// Cancellation is idempotent - only the first reason is kept.
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    /// Creates a new token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// This is idempotent - only the first reason is kept.
    /// Callbacks are invoked immediately. Panics in callbacks are logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        let fired = {
            let mut registrations = self.state.registrations.lock();
            // Only set if not already cancelled (first reason wins)
            if self
                .state
                .cancelled
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            registrations.reason = Some(reason.into());
            std::mem::take(&mut registrations.callbacks)
        };

        // Outside the lock, so a callback may touch the token itself.
        for callback in &fired {
            invoke(callback);
        }
    }

    /// Requests cancellation after a delay.
    ///
    /// The timer runs on the current tokio runtime; an earlier manual
    /// `cancel` wins and the delayed request becomes a no-op.
    pub fn cancel_after(&self, delay: Duration, reason: impl Into<String>) {
        let token = self.clone();
        let reason = reason.into();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel(reason);
        });
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately. A callback
    /// registered concurrently with `cancel` fires exactly once, on
    /// whichever side of the transition it lands.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        {
            let mut registrations = self.state.registrations.lock();
            if !self.state.cancelled.load(Ordering::SeqCst) {
                registrations.callbacks.push(Box::new(callback));
                return;
            }
        }
        invoke(&callback);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.state.registrations.lock().reason.clone()
    }

    /// Errors with [`StepflowError::Cancelled`] if cancellation was requested.
    ///
    /// Called at operation boundaries so a cancelled run stops before the
    /// next unit of work starts.
    pub fn checkpoint(&self) -> Result<(), StepflowError> {
        if self.is_cancelled() {
            Err(StepflowError::Cancelled {
                reason: self.reason().unwrap_or_else(|| "cancelled".to_string()),
            })
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
