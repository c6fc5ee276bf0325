//! Cooperative cancellation and scope cleanup.
//!
//! Cancellation is never preemptive: tokens are checked at defined
//! boundaries (before each pipeline step, before each resource operation)
//! and an observed cancellation propagates to the caller unchanged.

mod cleanup;
mod token;

pub use cleanup::{run_with_teardown, CleanupStack, DisposeGuard, TeardownCallback};
pub use token::{CancelCallback, CancelToken};
