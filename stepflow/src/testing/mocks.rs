//! Mock steps and resources for testing.

use crate::cancellation::CancelToken;
use crate::resource::{Operate, Teardown};
use crate::steps::Step;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Error type with stable identity for failure-propagation tests.
///
/// Tests downcast a surfaced error back to this type to prove the pipeline
/// did not rewrap or replace the original cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InjectedFailure(pub String);

/// A step over `i32` that records every invocation and adds a fixed delta.
#[derive(Debug)]
pub struct RecordingStep {
    name: String,
    delta: i32,
    calls: AtomicUsize,
    inputs: Mutex<Vec<i32>>,
}

impl RecordingStep {
    /// Creates a recording step adding `delta` to its input.
    #[must_use]
    pub fn new(name: impl Into<String>, delta: i32) -> Self {
        Self {
            name: name.into(),
            delta,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the step ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the inputs from each invocation, in order.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<i32> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Step<i32> for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: i32, _token: CancelToken) -> anyhow::Result<i32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().push(input);
        Ok(input + self.delta)
    }
}

/// A step that always fails with an [`InjectedFailure`].
#[derive(Debug)]
pub struct FailingStep {
    name: String,
    message: String,
    calls: AtomicUsize,
}

impl FailingStep {
    /// Creates a failing step.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the step ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step<i32> for FailingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _input: i32, _token: CancelToken) -> anyhow::Result<i32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InjectedFailure(self.message.clone()).into())
    }
}

/// A step that sleeps before passing its input through.
#[derive(Debug)]
pub struct SlowStep {
    name: String,
    delay: Duration,
}

impl SlowStep {
    /// Creates a slow step.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }
}

#[async_trait]
impl Step<i32> for SlowStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: i32, _token: CancelToken) -> anyhow::Result<i32> {
        tokio::time::sleep(self.delay).await;
        Ok(input)
    }
}

/// A resource double that counts operations and teardowns.
///
/// Operations echo their input; a probe built with `failing` errors on every
/// operation instead. The counters outlive the probe, so tests can observe
/// teardown after ownership moved into a wrapper.
#[derive(Debug)]
pub struct TeardownProbe {
    operations: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
    failure: Option<String>,
}

impl TeardownProbe {
    /// Creates a probe whose operations echo their input.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: Arc::new(AtomicUsize::new(0)),
            teardowns: Arc::new(AtomicUsize::new(0)),
            failure: None,
        }
    }

    /// Creates a probe whose operations always fail with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Returns a handle to the operation counter.
    #[must_use]
    pub fn operations(&self) -> Arc<AtomicUsize> {
        self.operations.clone()
    }

    /// Returns a handle to the teardown counter.
    #[must_use]
    pub fn teardowns(&self) -> Arc<AtomicUsize> {
        self.teardowns.clone()
    }
}

impl Default for TeardownProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operate<i32> for TeardownProbe {
    type Output = i32;

    async fn operate(&mut self, input: i32) -> anyhow::Result<i32> {
        if let Some(message) = &self.failure {
            return Err(InjectedFailure(message.clone()).into());
        }
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(input)
    }
}

#[async_trait]
impl Teardown for TeardownProbe {
    async fn teardown(&mut self) {
        tokio::task::yield_now().await;
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
