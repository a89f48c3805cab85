//! Execution state models

use crate::core::error::{ActionError, ActionErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Lifecycle of one engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// Levels are being executed
    Running,
    /// Every level finished without a failing step
    Completed,
    /// A step failed; later levels were not started
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// Terminal status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    /// The step's condition was false; counts as a non-failing completion
    Skipped,
    Failed(ActionErrorKind),
}

/// Outcome of one step execution attempt
#[derive(Debug)]
pub struct StepResult {
    pub step_id: String,
    pub step_name: String,
    /// True when the condition evaluated to false and the action never ran
    pub skipped: bool,
    pub error: Option<ActionError>,
    /// Full text of the step's log, taken once the step finished
    pub log: String,
    /// Where the log was written; gone after the run unless a log dir was kept
    pub log_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    pub fn status(&self) -> StepStatus {
        match (&self.error, self.skipped) {
            (Some(err), _) => StepStatus::Failed(err.kind()),
            (None, true) => StepStatus::Skipped,
            (None, false) => StepStatus::Success,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Captured stdout/stderr of the step, available after the run ends
    pub fn read_log(&self) -> &str {
        &self.log
    }
}

/// Final outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed {
        step_id: String,
        kind: ActionErrorKind,
        message: String,
        /// Full captured output of the failing step
        log: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failed { .. } => 1,
        }
    }
}

/// Everything known about a finished run
#[derive(Debug)]
pub struct RunReport {
    /// Unique execution ID
    pub execution_id: Uuid,
    pub pipeline_name: String,
    pub status: ExecutionStatus,
    pub outcome: RunOutcome,
    /// Results of every step that was started, in level then declaration order
    pub results: Vec<StepResult>,
    /// Total number of steps in the plan
    pub total_steps: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn result(&self, step_id: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_id == step_id)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }

    pub fn failed_steps(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Fraction of planned steps that reached a terminal status (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.results.len() as f64 / self.total_steps as f64
    }
}
