//! Sequential pipeline execution with cancellation checkpoints.

use super::report::{RunId, RunReport, StepReport};
use super::sink::{NoOpReportSink, ReportSink};
use crate::cancellation::CancelToken;
use crate::errors::StepflowError;
use crate::steps::{FnStep, Step};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a successful pipeline run.
#[derive(Debug)]
pub struct RunOutcome<T> {
    /// Every step's output, in execution order, for the caller to compose.
    pub outputs: Vec<T>,
    /// Timing and status record for the run.
    pub report: RunReport,
}

impl<T> RunOutcome<T> {
    /// Returns the final step's output, if any step ran.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.outputs.last()
    }

    /// Consumes the outcome, returning the final step's output.
    #[must_use]
    pub fn into_last(self) -> Option<T> {
        self.outputs.into_iter().last()
    }
}

/// An ordered, cancellable chain of steps over values of type `T`.
///
/// Steps run strictly one after another; step N+1 never starts before step N
/// completes. The pipeline holds no run state, so one pipeline value may be
/// shared and run concurrently.
pub struct Pipeline<T: Send + 'static> {
    name: String,
    steps: Vec<Arc<dyn Step<T>>>,
    sink: Arc<dyn ReportSink>,
}

impl<T: Send + 'static> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: Send + 'static> Pipeline<T> {
    /// Starts building a pipeline with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder<T> {
        PipelineBuilder::new(name)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order, threading each output into the next step.
    ///
    /// The token is checked before each step; a step that has not started
    /// when cancellation is observed is never invoked, and the run ends with
    /// [`StepflowError::Cancelled`]. A failing step ends the run with its
    /// original error preserved as the source of
    /// [`StepflowError::StepFailed`]. Errors are never caught and converted
    /// into default values.
    ///
    /// A report is recorded to the configured sink on every path.
    pub async fn run(&self, seed: T, token: &CancelToken) -> Result<RunOutcome<T>, StepflowError>
    where
        T: Clone,
    {
        let run_id = RunId::new();
        let run_started = Utc::now();
        let mut step_reports = Vec::with_capacity(self.steps.len());
        let mut outputs = Vec::with_capacity(self.steps.len());
        let mut value = seed;

        debug!(
            pipeline = %self.name,
            run_id = %run_id,
            steps = self.steps.len(),
            "run started"
        );

        for (index, step) in self.steps.iter().enumerate() {
            if let Err(err) = token.checkpoint() {
                let reason = token.reason().unwrap_or_else(|| "cancelled".to_string());
                warn!(
                    pipeline = %self.name,
                    run_id = %run_id,
                    step = step.name(),
                    %reason,
                    "run cancelled before step"
                );
                step_reports.push(StepReport::cancelled(step.name(), reason));
                self.mark_remaining_skipped(&mut step_reports, index + 1);
                self.record(run_id, run_started, step_reports);
                return Err(err);
            }

            let started_at = Utc::now();
            debug!(pipeline = %self.name, run_id = %run_id, step = step.name(), "step started");

            match step.run(value, token.clone()).await {
                Ok(next) => {
                    step_reports.push(StepReport::completed(step.name(), started_at));
                    outputs.push(next.clone());
                    value = next;
                }
                Err(source) => {
                    warn!(
                        pipeline = %self.name,
                        run_id = %run_id,
                        step = step.name(),
                        error = %source,
                        "step failed"
                    );
                    step_reports.push(StepReport::failed(
                        step.name(),
                        started_at,
                        source.to_string(),
                    ));
                    self.mark_remaining_skipped(&mut step_reports, index + 1);
                    self.record(run_id, run_started, step_reports);
                    return Err(StepflowError::StepFailed {
                        step: step.name().to_string(),
                        source,
                    });
                }
            }
        }

        let report = self.record(run_id, run_started, step_reports);
        debug!(
            pipeline = %self.name,
            run_id = %run_id,
            duration_ms = report.duration_ms(),
            "run completed"
        );

        Ok(RunOutcome { outputs, report })
    }

    fn mark_remaining_skipped(&self, step_reports: &mut Vec<StepReport>, from: usize) {
        for step in &self.steps[from..] {
            step_reports.push(StepReport::skipped(step.name()));
        }
    }

    fn record(
        &self,
        run_id: RunId,
        started_at: DateTime<Utc>,
        steps: Vec<StepReport>,
    ) -> RunReport {
        let report = RunReport {
            run_id,
            pipeline: self.name.clone(),
            started_at,
            ended_at: Utc::now(),
            steps,
        };
        self.sink.record(&report);
        report
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<T: Send + 'static> {
    name: String,
    steps: Vec<Arc<dyn Step<T>>>,
    sink: Arc<dyn ReportSink>,
}

impl<T: Send + 'static> PipelineBuilder<T> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            sink: Arc::new(NoOpReportSink),
        }
    }

    /// Appends a step to the chain.
    #[must_use]
    pub fn step(mut self, step: impl Step<T> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends a closure-backed step to the chain.
    #[must_use]
    pub fn step_fn<F, Fut>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(T, CancelToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.step(FnStep::new(name, func))
    }

    /// Sets the report sink for runs of this pipeline.
    #[must_use]
    pub fn report_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline<T> {
        Pipeline {
            name: self.name,
            steps: self.steps,
            sink: self.sink,
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for PipelineBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}
