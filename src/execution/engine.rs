//! Main execution engine - walks the plan level by level

use crate::{
    actions::ActionDispatcher,
    core::{
        process_environment, ActionErrorKind, ActionError, ExecutionStatus, FsProbe, LocalFs, Pipeline,
        RunOutcome, RunReport, StepResult, StepStatus,
    },
    execution::{ExecutionPlan, RunDirectory, StepExecutor},
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        levels: usize,
    },
    LevelStarted {
        index: usize,
        step_ids: Vec<String>,
    },
    StepStarted {
        step_id: String,
    },
    /// Captured output of a finished step, published after the level barrier
    StepLog {
        step_id: String,
        log: String,
    },
    StepSucceeded {
        step_id: String,
    },
    StepSkipped {
        step_id: String,
    },
    StepFailed {
        step_id: String,
        kind: ActionErrorKind,
        error: String,
    },
    PipelineFinished {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Failures of the engine itself, as opposed to step failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Planning(#[from] crate::core::PlanningError),

    #[error("execution plan does not match pipeline '{0}'")]
    PlanMismatch(String),

    #[error("run directory unavailable: {0}")]
    RunDirectory(#[from] std::io::Error),
}

/// Fork-join pipeline engine.
///
/// Levels run strictly one after another. Inside a level every step gets its
/// own task, environment copy and log; the level ends once all of them have
/// finished. A failure stops later levels from starting but never interrupts
/// siblings already running.
pub struct ExecutionEngine {
    executor: Arc<StepExecutor>,
    base_env: Arc<HashMap<String, String>>,
    log_dir: Option<PathBuf>,
    event_handlers: Vec<EventHandler>,
    status: ExecutionStatus,
}

impl ExecutionEngine {
    /// Engine using the current process environment and the local filesystem
    pub fn new(dispatcher: ActionDispatcher) -> Self {
        Self {
            executor: Arc::new(StepExecutor::new(dispatcher, Arc::new(LocalFs))),
            base_env: Arc::new(process_environment()),
            log_dir: None,
            event_handlers: Vec::new(),
            status: ExecutionStatus::Pending,
        }
    }

    /// Replace the environment steps inherit and conditions are checked against
    pub fn with_base_env(mut self, env: HashMap<String, String>) -> Self {
        self.base_env = Arc::new(env);
        self
    }

    pub fn with_fs_probe(mut self, fs: Arc<dyn FsProbe>) -> Self {
        let dispatcher = self.executor.dispatcher().clone();
        self.executor = Arc::new(StepExecutor::new(dispatcher, fs));
        self
    }

    /// Keep step logs under `dir/<execution-id>` instead of a temporary directory
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Plan `pipeline` and run it
    pub async fn plan_and_run(self, pipeline: &Pipeline) -> Result<RunReport, EngineError> {
        let plan = crate::execution::plan(pipeline)?;
        self.run(&plan, pipeline).await
    }

    /// Execute every level of `plan`. Consumes the engine: one instance per run.
    pub async fn run(mut self, plan: &ExecutionPlan, pipeline: &Pipeline) -> Result<RunReport, EngineError> {
        let step_count = pipeline.steps.len();
        if !plan.fits(pipeline) {
            return Err(EngineError::PlanMismatch(pipeline.name.clone()));
        }

        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let run_dir = match &self.log_dir {
            Some(dir) => RunDirectory::persistent(dir.join(execution_id.to_string()))?,
            None => RunDirectory::temporary()?,
        };

        info!("Starting pipeline execution: {} ({})", pipeline.name, execution_id);
        self.status = ExecutionStatus::Running;
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            levels: plan.len(),
        });

        let shared = Arc::new(pipeline.clone());
        let mut results: Vec<StepResult> = Vec::with_capacity(step_count);
        let mut outcome = RunOutcome::Success;

        for (level_index, level) in plan.levels().iter().enumerate() {
            let step_ids: Vec<String> = level.steps.iter().map(|&i| pipeline.steps[i].id.clone()).collect();
            info!("Level {}: {}", level_index, step_ids.join(", "));
            self.emit_event(ExecutionEvent::LevelStarted {
                index: level_index,
                step_ids,
            });

            let level_results = self.run_level(&level.steps, &shared, &run_dir).await?;

            // Barrier passed: report in declaration order regardless of finish order.
            for result in &level_results {
                self.emit_event(ExecutionEvent::StepLog {
                    step_id: result.step_id.clone(),
                    log: result.log.clone(),
                });

                match (&result.error, result.status()) {
                    (Some(err), _) => {
                        error!("Step {} failed: {}", result.step_id, err);
                        self.emit_event(ExecutionEvent::StepFailed {
                            step_id: result.step_id.clone(),
                            kind: err.kind(),
                            error: err.to_string(),
                        });
                        if outcome.is_success() {
                            outcome = RunOutcome::Failed {
                                step_id: result.step_id.clone(),
                                kind: err.kind(),
                                message: err.to_string(),
                                log: result.log.clone(),
                            };
                        }
                    }
                    (None, StepStatus::Skipped) => self.emit_event(ExecutionEvent::StepSkipped {
                        step_id: result.step_id.clone(),
                    }),
                    (None, _) => self.emit_event(ExecutionEvent::StepSucceeded {
                        step_id: result.step_id.clone(),
                    }),
                }
            }

            results.extend(level_results);
            if !outcome.is_success() {
                info!("Not starting remaining levels after failure");
                break;
            }
        }

        self.status = if outcome.is_success() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        info!("Pipeline execution finished: {} - {:?}", pipeline.name, self.status);
        self.emit_event(ExecutionEvent::PipelineFinished {
            execution_id,
            status: self.status,
        });

        Ok(RunReport {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            status: self.status,
            outcome,
            results,
            total_steps: step_count,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Run one level and return its results in declaration order
    async fn run_level(
        &self,
        indices: &[usize],
        pipeline: &Arc<Pipeline>,
        run_dir: &RunDirectory,
    ) -> Result<Vec<StepResult>, EngineError> {
        let mut logs = Vec::with_capacity(indices.len());
        for &index in indices {
            logs.push(run_dir.create_log(index, &pipeline.steps[index].id)?);
        }

        // A lone step runs inline, no task needed.
        if let [index] = *indices {
            if let Some(log) = logs.pop() {
                self.emit_event(ExecutionEvent::StepStarted {
                    step_id: pipeline.steps[index].id.clone(),
                });
                let result = self.executor.execute(pipeline, index, &self.base_env, log).await;
                return Ok(vec![result]);
            }
        }

        let mut handles = Vec::with_capacity(indices.len());
        for (&index, log) in indices.iter().zip(logs) {
            self.emit_event(ExecutionEvent::StepStarted {
                step_id: pipeline.steps[index].id.clone(),
            });
            let executor = Arc::clone(&self.executor);
            let pipeline = Arc::clone(pipeline);
            let base_env = Arc::clone(&self.base_env);
            let log_path = log.path().to_path_buf();
            let handle = tokio::spawn(async move { executor.execute(&pipeline, index, &base_env, log).await });
            handles.push((index, log_path, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, log_path, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => {
                    let step = &pipeline.steps[index];
                    error!("Task for step {} did not complete: {}", step.id, join_error);
                    StepResult {
                        step_id: step.id.clone(),
                        step_name: step.name.clone(),
                        skipped: false,
                        error: Some(ActionError::Io(std::io::Error::other(format!(
                            "step task aborted: {}",
                            join_error
                        )))),
                        log: std::fs::read_to_string(&log_path).unwrap_or_default(),
                        log_path,
                        started_at: Utc::now(),
                        finished_at: Utc::now(),
                    }
                }
            };
            results.push(result);
        }

        Ok(results)
    }
}
