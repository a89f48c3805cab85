//! Step executor - runs a single step: condition first, then its action

use crate::{
    actions::ActionDispatcher,
    core::{should_run, FsProbe, Pipeline, StepContext, StepResult},
    execution::StepLog,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes individual steps
pub struct StepExecutor {
    dispatcher: ActionDispatcher,
    fs: Arc<dyn FsProbe>,
}

impl StepExecutor {
    pub fn new(dispatcher: ActionDispatcher, fs: Arc<dyn FsProbe>) -> Self {
        Self { dispatcher, fs }
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Execute the step at `index` and return its result.
    ///
    /// The condition is checked against `base_env`; the action receives a
    /// private copy of `base_env` overlaid with pipeline and step entries.
    /// The finished log is read back into the result, so it outlives the
    /// run directory.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        index: usize,
        base_env: &HashMap<String, String>,
        mut log: StepLog,
    ) -> StepResult {
        let step = &pipeline.steps[index];
        let started_at = Utc::now();

        let runs = should_run(step.condition.as_ref(), base_env, self.fs.as_ref());
        let (skipped, error) = if runs {
            info!("Executing step: {}", step.id);
            let context = StepContext::for_step(base_env, pipeline, step);
            match self
                .dispatcher
                .execute(&step.action, &pipeline.toolchain, &context.env, &mut log)
                .await
            {
                Ok(()) => {
                    debug!("Step {} succeeded", step.id);
                    (false, None)
                }
                Err(e) => {
                    warn!("Step {} failed: {}", step.id, e);
                    // The log may itself be the thing failing; the error is kept either way.
                    log.line(&format!("error: {}", e)).ok();
                    (false, Some(e))
                }
            }
        } else {
            info!("Skipping step {}: condition not met", step.id);
            log.line("skipped: condition not met").ok();
            (true, None)
        };

        let captured = match log.contents() {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read log of step {}: {}", step.id, e);
                String::new()
            }
        };

        StepResult {
            step_id: step.id.clone(),
            step_name: step.name.clone(),
            skipped,
            error,
            log: captured,
            log_path: log.path().to_path_buf(),
            started_at,
            finished_at: Utc::now(),
        }
    }
}
