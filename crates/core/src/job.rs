//! Job record and its forward-only status machine.
//!
//! A [`JobRecord`] is mutated exclusively through [`JobRecord::apply`],
//! which enforces:
//!
//! - status moves `Pending -> Running -> Completed | Failed`, never backward
//!   and never skipping `Running`;
//! - `progress` never decreases and reaches 100 only on completion;
//! - `result` is set iff `Completed`, `error` is set iff `Failed`.

use serde::{Deserialize, Serialize};

use crate::request::AnalysisRequest;
use crate::types::{SessionId, Timestamp};

/// Progress value of a completed job.
pub const PROGRESS_COMPLETE: u8 = 100;

/// `current_task` text written on completion.
pub const TASK_COMPLETE: &str = "Analysis complete!";

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` and `Failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position in the lifecycle; terminal states share the last rank.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
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

/// A state mutation applied to a [`JobRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    /// `Pending -> Running` at the given checkpoint.
    Start { progress: u8, current_task: String },
    /// Advance a running job to a later checkpoint.
    Progress { progress: u8, current_task: String },
    /// `Running -> Completed` with the final report.
    Complete { result: String },
    /// `Running -> Failed` with a human-readable cause.
    Fail { error: String },
}

impl JobUpdate {
    pub fn start(progress: u8, current_task: impl Into<String>) -> Self {
        JobUpdate::Start {
            progress,
            current_task: current_task.into(),
        }
    }

    pub fn progress(progress: u8, current_task: impl Into<String>) -> Self {
        JobUpdate::Progress {
            progress,
            current_task: current_task.into(),
        }
    }

    pub fn complete(result: impl Into<String>) -> Self {
        JobUpdate::Complete {
            result: result.into(),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        JobUpdate::Fail {
            error: error.into(),
        }
    }
}

/// Rejected [`JobUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a job in status {from}")]
    IllegalStatus {
        from: JobStatus,
        action: &'static str,
    },

    #[error("progress may not move from {from} to {to}")]
    ProgressRegression { from: u8, to: u8 },

    #[error("progress {0} is reserved for completed jobs")]
    ProgressOutOfRange(u8),
}

/// State tracked for one submitted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub session_id: SessionId,
    pub status: JobStatus,
    pub progress: u8,
    pub current_task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub request: AnalysisRequest,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    /// A fresh `Pending` record at progress 0.
    pub fn new(session_id: SessionId, request: AnalysisRequest, now: Timestamp) -> Self {
        Self {
            session_id,
            status: JobStatus::Pending,
            progress: 0,
            current_task: "Queued".to_string(),
            result: None,
            error: None,
            request,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `update`, or leave the record untouched and return why not.
    pub fn apply(&mut self, update: JobUpdate, now: Timestamp) -> Result<(), TransitionError> {
        match update {
            JobUpdate::Start {
                progress,
                current_task,
            } => {
                self.require(JobStatus::Pending, "start")?;
                self.check_progress(progress)?;
                self.status = JobStatus::Running;
                self.progress = progress;
                self.current_task = current_task;
            }
            JobUpdate::Progress {
                progress,
                current_task,
            } => {
                self.require(JobStatus::Running, "advance")?;
                self.check_progress(progress)?;
                self.progress = progress;
                self.current_task = current_task;
            }
            JobUpdate::Complete { result } => {
                self.require(JobStatus::Running, "complete")?;
                self.status = JobStatus::Completed;
                self.progress = PROGRESS_COMPLETE;
                self.current_task = TASK_COMPLETE.to_string();
                self.result = Some(result);
            }
            JobUpdate::Fail { error } => {
                self.require(JobStatus::Running, "fail")?;
                self.status = JobStatus::Failed;
                self.current_task = format!("Error: {error}");
                self.error = Some(error);
            }
        }
        self.updated_at = now;
        Ok(())
    }

    fn require(&self, expected: JobStatus, action: &'static str) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError::IllegalStatus {
                from: self.status,
                action,
            })
        }
    }

    fn check_progress(&self, to: u8) -> Result<(), TransitionError> {
        if to >= PROGRESS_COMPLETE {
            return Err(TransitionError::ProgressOutOfRange(to));
        }
        if to < self.progress {
            return Err(TransitionError::ProgressRegression {
                from: self.progress,
                to,
            });
        }
        Ok(())
    }
}
