//! Test doubles for pipelines and resources.
//!
//! Hand-written doubles in place of a mocking framework: step behaviour here
//! is simple enough that recording counters beat generated mocks.

mod mocks;

pub use mocks::{FailingStep, InjectedFailure, RecordingStep, SlowStep, TeardownProbe};
