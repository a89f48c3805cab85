//! Persistence layer for pipeline run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

pub use crate::core::ExecutionStatus;
use crate::core::{ActionErrorKind, RunOutcome, RunReport, StepStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Summary of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Pipeline name
    pub pipeline_name: String,

    /// Final run status
    pub status: ExecutionStatus,

    /// First failing step, if any
    pub failed_step: Option<String>,

    /// Error kind of the first failing step
    pub failure_kind: Option<ActionErrorKind>,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Number of steps in the plan
    pub total_steps: usize,
    pub succeeded_steps: usize,
    pub skipped_steps: usize,
    pub failed_steps: usize,
}

impl RunSummary {
    /// Steps that never started because an earlier level failed
    pub fn not_started(&self) -> usize {
        self.total_steps
            .saturating_sub(self.succeeded_steps + self.skipped_steps + self.failed_steps)
    }
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        let (failed_step, failure_kind) = match &report.outcome {
            RunOutcome::Success => (None, None),
            RunOutcome::Failed { step_id, kind, .. } => (Some(step_id.clone()), Some(*kind)),
        };

        RunSummary {
            execution_id: report.execution_id,
            pipeline_name: report.pipeline_name.clone(),
            status: report.status,
            failed_step,
            failure_kind,
            started_at: report.started_at,
            completed_at: report.completed_at,
            total_steps: report.total_steps,
            succeeded_steps: report.count(StepStatus::Success),
            skipped_steps: report.count(StepStatus::Skipped),
            failed_steps: report.failed_steps(),
        }
    }
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a run
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, execution_id: Uuid) -> Result<Option<RunSummary>>;

    /// List runs of a pipeline, newest first
    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>>;

    /// List all pipeline names, sorted
    async fn list_pipelines(&self) -> Result<Vec<String>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    runs: tokio::sync::RwLock<HashMap<Uuid, RunSummary>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        self.runs.write().await.insert(run.execution_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, execution_id: Uuid) -> Result<Option<RunSummary>> {
        Ok(self.runs.read().await.get(&execution_id).cloned())
    }

    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let mut result: Vec<RunSummary> = runs
            .values()
            .filter(|r| r.pipeline_name == pipeline_name)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(result)
    }

    async fn list_pipelines(&self) -> Result<Vec<String>> {
        let runs = self.runs.read().await;
        let mut names: Vec<String> = runs.values().map(|r| r.pipeline_name.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
