//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::results::ResultRecord;

/// Advisory attached to runs that exit with the "thresholds exceeded" code.
pub const THRESHOLD_WARNING: &str =
    "Test completed but some performance thresholds were exceeded";

/// One tracked execution of an external load-test run.
///
/// Written only by the task supervising the run; everyone else works on
/// clones taken under a read lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: Option<f64>,
    pub script_path: PathBuf,
    pub output_path: PathBuf,
    pub command: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub threshold_warning: Option<String>,
    pub results: Option<ResultRecord>,
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job can no longer change status
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Submitted, JobStatus::Running)
                | (JobStatus::Submitted, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move job from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Job {
    /// Creates a freshly submitted job
    pub fn new(id: Uuid, script_path: PathBuf, output_path: PathBuf, command: String) -> Self {
        Self {
            id,
            status: JobStatus::Submitted,
            progress: None,
            script_path,
            output_path,
            command,
            start_time: Utc::now(),
            end_time: None,
            error: None,
            threshold_warning: None,
            results: None,
        }
    }

    /// Moves the job forward, stamping `end_time` on terminal states
    pub fn advance(&mut self, next: JobStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        if next.is_terminal() {
            // Clock skew must never produce an end before the start.
            self.end_time = Some(Utc::now().max(self.start_time));
        }
        Ok(())
    }

    /// Marks the job failed with a description
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Records a progress percentage, clamped to [0, 100]
    ///
    /// Ignored once the job is terminal.
    pub fn set_progress(&mut self, percent: f64) {
        if self.status.is_terminal() || !percent.is_finite() {
            return;
        }
        self.progress = Some(percent.clamp(0.0, 100.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(
            Uuid::new_v4(),
            PathBuf::from("scripts/a.js"),
            PathBuf::from("results/a-output.json"),
            "k6 run /scripts/a.js".to_string(),
        )
    }

    #[test]
    fn test_new_job_is_submitted() {
        let job = job();
        assert_eq!(job.status, JobStatus::Submitted);
        assert!(job.end_time.is_none());
        assert!(job.progress.is_none());
    }

    #[test]
    fn test_forward_transitions() {
        let mut job = job();
        assert!(job.advance(JobStatus::Running).is_ok());
        assert!(job.end_time.is_none());
        assert!(job.advance(JobStatus::Completed).is_ok());
        let end = job.end_time.unwrap();
        assert!(end >= job.start_time);
    }

    #[test]
    fn test_status_never_reverts() {
        let mut job = job();
        job.advance(JobStatus::Running).unwrap();
        job.advance(JobStatus::Completed).unwrap();

        let err = job.advance(JobStatus::Running).unwrap_err();
        assert_eq!(err.from, JobStatus::Completed);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.fail("late").is_err());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_launch_failure_skips_running() {
        let mut job = job();
        job.fail("spawn failed").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("spawn failed"));
        assert!(job.end_time.is_some());
    }

    #[test]
    fn test_submitted_cannot_complete_directly() {
        let mut job = job();
        assert!(job.advance(JobStatus::Completed).is_err());
    }

    #[test]
    fn test_progress_clamped_and_frozen_after_terminal() {
        let mut job = job();
        job.advance(JobStatus::Running).unwrap();
        job.set_progress(140.0);
        assert_eq!(job.progress, Some(100.0));
        job.set_progress(12.5);
        assert_eq!(job.progress, Some(12.5));

        job.advance(JobStatus::Failed).unwrap();
        job.set_progress(50.0);
        assert_eq!(job.progress, Some(12.5));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
