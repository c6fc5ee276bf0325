//! Run reports: per-step timing and status records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Terminal status of one step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step ran to completion.
    Completed,
    /// Step ran and failed.
    Failed,
    /// Cancellation was observed at this step's boundary; the step never started.
    Cancelled,
    /// Step came after a failure or cancellation and was never considered.
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Timing and status record for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name.
    pub name: String,
    /// Terminal status.
    pub status: StepStatus,
    /// When the step started (or when the boundary was reached).
    pub started_at: DateTime<Utc>,
    /// When the step ended.
    pub ended_at: DateTime<Utc>,
    /// Error message for failed steps, cancellation reason for cancelled ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    /// Creates a completed step record.
    #[must_use]
    pub fn completed(name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Completed,
            started_at,
            ended_at: Utc::now(),
            error: None,
        }
    }

    /// Creates a failed step record.
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Failed,
            started_at,
            ended_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Creates a cancelled-at-boundary step record.
    #[must_use]
    pub fn cancelled(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            status: StepStatus::Cancelled,
            started_at: now,
            ended_at: now,
            error: Some(reason.into()),
        }
    }

    /// Creates a skipped step record.
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            status: StepStatus::Skipped,
            started_at: now,
            ended_at: now,
            error: None,
        }
    }

    /// Returns the step duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if the step completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, StepStatus::Completed)
    }
}

/// Full record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identity.
    pub run_id: RunId,
    /// Pipeline name.
    pub pipeline: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
    /// One record per step, in pipeline order.
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Returns the run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if every step completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(StepReport::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_step_report_completed() {
        let report = StepReport::completed("fetch", Utc::now());

        assert_eq!(report.name, "fetch");
        assert!(report.is_success());
        assert!(report.error.is_none());
    }

    #[test]
    fn test_step_report_failed_keeps_message() {
        let report = StepReport::failed("fetch", Utc::now(), "connection reset");

        assert_eq!(report.status, StepStatus::Failed);
        assert_eq!(report.error, Some("connection reset".to_string()));
        assert!(!report.is_success());
    }

    #[test]
    fn test_step_report_cancelled_keeps_reason() {
        let report = StepReport::cancelled("store", "deadline");

        assert_eq!(report.status, StepStatus::Cancelled);
        assert_eq!(report.error, Some("deadline".to_string()));
    }

    #[test]
    fn test_step_status_display() {
        assert_eq!(format!("{}", StepStatus::Completed), "completed");
        assert_eq!(format!("{}", StepStatus::Failed), "failed");
        assert_eq!(format!("{}", StepStatus::Cancelled), "cancelled");
        assert_eq!(format!("{}", StepStatus::Skipped), "skipped");
    }

    #[test]
    fn test_run_report_success() {
        let now = Utc::now();
        let report = RunReport {
            run_id: RunId::new(),
            pipeline: "p".to_string(),
            started_at: now,
            ended_at: now,
            steps: vec![
                StepReport::completed("a", now),
                StepReport::completed("b", now),
            ],
        };

        assert!(report.is_success());
    }

    #[test]
    fn test_run_report_serialization_round_trip() {
        let now = Utc::now();
        let report = RunReport {
            run_id: RunId::new(),
            pipeline: "p".to_string(),
            started_at: now,
            ended_at: now,
            steps: vec![StepReport::failed("a", now, "boom")],
        };

        let json = serde_json::to_string(&report).expect("serializes");
        let deserialized: RunReport = serde_json::from_str(&json).expect("deserializes");

        assert_eq!(report.run_id, deserialized.run_id);
        assert_eq!(deserialized.steps[0].error, Some("boom".to_string()));
    }
}
