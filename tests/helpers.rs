//! Test utility functions for stepflow
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stepflow::core::config::PipelineConfig;
use stepflow::core::{Action, Pipeline, RunOutcome, RunReport, Step, StepStatus};
use stepflow::execution::ExecutionEngine;
use stepflow::{ActionDispatcher, ActionErrorKind, ExecutionEvent};

/// Environment with just enough to find `sh` and friends
pub fn base_env() -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert("PATH".to_string(), std::env::var("PATH").unwrap_or_default());
    env
}

/// Engine isolated from the test runner's environment
pub fn engine() -> ExecutionEngine {
    ExecutionEngine::new(ActionDispatcher::default()).with_base_env(base_env())
}

pub fn shell(command: &str) -> Action {
    Action::Shell {
        command: command.to_string(),
        working_dir: None,
    }
}

/// Shell step with the given dependencies
pub fn shell_step(id: &str, command: &str, deps: &[&str]) -> Step {
    Step::new(id, shell(command)).depends_on(deps.iter().copied())
}

/// Pipeline of steps that only declare dependencies
pub fn dag(steps: &[(&str, &[&str])]) -> Pipeline {
    steps.iter().fold(Pipeline::new("dag"), |pipeline, (id, deps)| {
        pipeline.with_step(shell_step(id, "true", deps))
    })
}

pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .expect("pipeline yaml should parse")
        .to_pipeline()
}

/// Result of running a pipeline plus every event it emitted
pub struct PipelineTestResult {
    pub report: RunReport,
    pub events: Vec<ExecutionEvent>,
}

impl PipelineTestResult {
    pub fn status_of(&self, step_id: &str) -> Option<StepStatus> {
        self.report.result(step_id).map(|r| r.status())
    }

    pub fn log_of(&self, step_id: &str) -> String {
        self.events
            .iter()
            .find_map(|event| match event {
                ExecutionEvent::StepLog { step_id: id, log } if id == step_id => Some(log.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Step ids in the order their logs were emitted
    pub fn log_order(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ExecutionEvent::StepLog { step_id, .. } => Some(step_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self, step_id: &str) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, ExecutionEvent::StepStarted { step_id: id } if id == step_id))
    }
}

/// Run with an explicit engine, collecting events
pub async fn run_with(engine: ExecutionEngine, pipeline: &Pipeline) -> PipelineTestResult {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut engine = engine;
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let report = engine.plan_and_run(pipeline).await.expect("pipeline should plan and run");
    let events = events.lock().unwrap().clone();
    PipelineTestResult { report, events }
}

pub async fn run_pipeline(pipeline: &Pipeline) -> PipelineTestResult {
    run_with(engine(), pipeline).await
}

pub fn assert_pipeline_succeeded(result: &PipelineTestResult) {
    assert!(
        result.report.outcome.is_success(),
        "expected success, got {:?}",
        result.report.outcome
    );
}

/// Assert the run failed, naming the first failing step and its kind
pub fn assert_pipeline_failed_at(result: &PipelineTestResult, step_id: &str, kind: ActionErrorKind) {
    match &result.report.outcome {
        RunOutcome::Failed { step_id: id, kind: k, .. } => {
            assert_eq!(id, step_id, "unexpected first failing step");
            assert_eq!(*k, kind, "unexpected error kind");
        }
        RunOutcome::Success => panic!("expected failure at {}, pipeline succeeded", step_id),
    }
    assert_eq!(result.report.outcome.exit_code(), 1);
}

pub fn assert_step_status(result: &PipelineTestResult, step_id: &str, status: StepStatus) {
    assert_eq!(
        result.status_of(step_id),
        Some(status),
        "unexpected status for step {}",
        step_id
    );
}

pub fn assert_not_started(result: &PipelineTestResult, step_id: &str) {
    assert!(result.report.result(step_id).is_none(), "step {} should not have run", step_id);
    assert!(!result.started(step_id), "step {} should not have started", step_id);
}
