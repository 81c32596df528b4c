//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::job::{Job, JobStatus};
use crate::domain::results::{MetricStats, Provenance, TimeSeries};

/// Request to run a load-test script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJob {
    /// Script source handed to the runner verbatim
    pub script: String,
    /// Environment passed to the script, one runner flag per entry
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Response to a successful submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    pub status: StatusView,
}

/// Status as reported to pollers
///
/// Superset of [`JobStatus`] with the `not_found` answer for unknown ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusView {
    Submitted,
    Running,
    Completed,
    Failed,
    NotFound,
}

impl From<JobStatus> for StatusView {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Submitted => StatusView::Submitted,
            JobStatus::Running => StatusView::Running,
            JobStatus::Completed => StatusView::Completed,
            JobStatus::Failed => StatusView::Failed,
        }
    }
}

impl StatusView {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StatusView::Submitted | StatusView::Running)
    }
}

impl std::fmt::Display for StatusView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusView::Submitted => "submitted",
            StatusView::Running => "running",
            StatusView::Completed => "completed",
            StatusView::Failed => "failed",
            StatusView::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Pollable snapshot of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: StatusView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, MetricStats>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl JobStatusResponse {
    /// Answer for an id the registry has never issued
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: StatusView::NotFound,
            progress: None,
            error: None,
            threshold_warning: None,
            metrics: None,
            time_series: None,
            provenance: None,
            start_time: None,
            end_time: None,
        }
    }
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        let (metrics, time_series, provenance) = match job.results {
            Some(record) => (
                Some(record.metrics),
                record.time_series,
                Some(record.provenance),
            ),
            None => (None, None, None),
        };

        Self {
            job_id: job.id.to_string(),
            status: job.status.into(),
            progress: job.progress,
            error: job.error,
            threshold_warning: job.threshold_warning,
            metrics,
            time_series,
            provenance,
            start_time: Some(job.start_time),
            end_time: job.end_time,
        }
    }
}
