//! Pipeline building and execution.
//!
//! This module provides:
//! - A builder for ordered, cancellable step chains
//! - Sequential execution with cancellation checkpoints
//! - Run reports and report sinks for observability

mod report;
mod runner;
mod sink;


pub use report::{RunId, RunReport, StepReport, StepStatus};
pub use runner::{Pipeline, PipelineBuilder, RunOutcome};
pub use sink::{LoggingReportSink, NoOpReportSink, ReportSink};
