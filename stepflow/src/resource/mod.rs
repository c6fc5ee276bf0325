//! Cancellable resources with deterministic asynchronous teardown.
//!
//! A [`CancellableResource`] has exactly two states, `Open` and `Disposed`.
//! The transition is one-way and atomic, so concurrent disposal requests
//! collapse to a single real teardown, and every caller can await a
//! successful completion.

mod buffer;
mod scoped;
mod state;

pub use buffer::BufferSink;
pub use scoped::{using, CancellableResource, Operate, Teardown};
pub use state::DisposalState;
