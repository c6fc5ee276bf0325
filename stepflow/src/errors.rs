//! Error types for the stepflow library.
//!
//! The taxonomy keeps cancellation, step failure, and disposed-resource
//! access distinct. Nothing here is retried or downgraded; errors propagate
//! to the caller with their original cause intact.

use thiserror::Error;

/// The error type surfaced by pipeline runs and resource operations.
#[derive(Debug, Error)]
pub enum StepflowError {
    /// The run observed a cancellation request at a checkpoint.
    ///
    /// Always distinguishable from a domain failure; a cancelled run never
    /// reports as a failed step.
    #[error("cancelled: {reason}")]
    Cancelled {
        /// The reason given to the cancellation request.
        reason: String,
    },

    /// A unit of work failed with its own error.
    ///
    /// The original cause is carried as the source and stays downcastable to
    /// its concrete type; it is never replaced by a generic code or sentinel
    /// value.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        /// Name of the failing step or resource operation.
        step: String,
        /// The original error, with its cause chain intact.
        #[source]
        source: anyhow::Error,
    },

    /// An operation was attempted on a resource already torn down.
    #[error("resource '{resource}' is disposed")]
    ResourceDisposed {
        /// Name of the disposed resource.
        resource: String,
    },
}

impl StepflowError {
    /// Returns true if this is a cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if this is a step failure.
    #[must_use]
    pub fn is_step_failure(&self) -> bool {
        matches!(self, Self::StepFailed { .. })
    }

    /// Returns true if this is a disposed-resource error.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::ResourceDisposed { .. })
    }
}
