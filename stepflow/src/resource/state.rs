//! Atomic open/disposed state flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Atomic `Open -> Disposed` state flag.
///
/// The transition is one-way: of any number of callers racing on
/// `begin_dispose`, exactly one wins.
#[derive(Debug, Default)]
pub struct DisposalState {
    disposed: AtomicBool,
}

impl DisposalState {
    /// Creates the flag in the `Open` state.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Attempts the `Open -> Disposed` transition.
    ///
    /// Returns true for the single caller that wins the transition; every
    /// later or concurrent caller gets false.
    pub fn begin_dispose(&self) -> bool {
        self.disposed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns whether the state is `Disposed`.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
