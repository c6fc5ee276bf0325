//! Report sink trait and implementations.

use super::report::RunReport;
use tracing::{debug, info, Level};

/// Trait for sinks that receive run reports.
///
/// The pipeline records a report for every run, whatever its outcome.
/// Sinks must never raise; a broken sink cannot be allowed to change a
/// run's result.
pub trait ReportSink: Send + Sync {
    /// Records a finished run's report.
    fn record(&self, report: &RunReport);
}

impl<S: ReportSink + ?Sized> ReportSink for std::sync::Arc<S> {
    fn record(&self, report: &RunReport) {
        (**self).record(report);
    }
}

/// A no-op sink that discards all reports.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReportSink;

impl ReportSink for NoOpReportSink {
    fn record(&self, _report: &RunReport) {
        // Intentionally empty - discards all reports
    }
}

/// A sink that logs reports using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingReportSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingReportSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingReportSink {
    /// Creates a new logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl ReportSink for LoggingReportSink {
    fn record(&self, report: &RunReport) {
        if self.level == Level::DEBUG {
            debug!(
                run_id = %report.run_id,
                pipeline = %report.pipeline,
                duration_ms = report.duration_ms(),
                steps = report.steps.len(),
                success = report.is_success(),
                report = %serde_json::to_string(report).unwrap_or_default(),
                "pipeline run recorded"
            );
        } else {
            info!(
                run_id = %report.run_id,
                pipeline = %report.pipeline,
                duration_ms = report.duration_ms(),
                steps = report.steps.len(),
                success = report.is_success(),
                "pipeline run recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::RunId;
    use chrono::Utc;

    fn empty_report() -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: RunId::new(),
            pipeline: "p".to_string(),
            started_at: now,
            ended_at: now,
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_noop_sink() {
        let sink = NoOpReportSink;
        sink.record(&empty_report());
        // Should not panic
    }

    #[test]
    fn test_logging_sink_levels() {
        LoggingReportSink::info().record(&empty_report());
        LoggingReportSink::debug().record(&empty_report());
        // Should not panic
    }
}
