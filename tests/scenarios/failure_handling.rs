//! Test: Failure Handling - fail-fast after the level barrier

use crate::helpers::*;
use stepflow::core::{RunOutcome, StepStatus};
use stepflow::{ActionErrorKind, ExecutionStatus, Pipeline};

/// A failing shell command fails the run and keeps its stderr
#[tokio::test]
async fn test_shell_failure_captures_stderr() {
    let pipeline = Pipeline::new("fail").with_step(shell_step("broken", "echo boom >&2; exit 1", &[]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "broken", ActionErrorKind::CommandFailed);
    assert_eq!(result.report.status, ExecutionStatus::Failed);
    assert!(result.log_of("broken").contains("boom"));
    match &result.report.outcome {
        RunOutcome::Failed { log, message, .. } => {
            assert!(log.contains("boom"));
            assert!(message.contains("exit code 1"));
        }
        RunOutcome::Success => unreachable!(),
    }
}

/// One sibling fails, the other finishes; both logs come out in order
#[tokio::test]
async fn test_sibling_failure_keeps_both_logs() {
    let pipeline = Pipeline::new("siblings")
        .with_step(shell_step("slow_ok", "sleep 0.3; echo slow done", &[]))
        .with_step(shell_step("fast_fail", "echo fast failing; exit 3", &[]))
        .with_step(shell_step("after", "echo never", &["slow_ok", "fast_fail"]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "fast_fail", ActionErrorKind::CommandFailed);
    assert_step_status(&result, "slow_ok", StepStatus::Success);
    assert_eq!(result.log_order(), vec!["slow_ok", "fast_fail"]);
    assert!(result.log_of("slow_ok").contains("slow done"));
    assert!(result.log_of("fast_fail").contains("fast failing"));
    assert_not_started(&result, "after");
}

/// The first failure in declaration order is the one reported
#[tokio::test]
async fn test_first_failure_by_declaration_order() {
    let pipeline = Pipeline::new("two failures")
        .with_step(shell_step("first", "sleep 0.2; exit 1", &[]))
        .with_step(shell_step("second", "exit 2", &[]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "first", ActionErrorKind::CommandFailed);
    assert_eq!(result.report.failed_steps(), 2);
}

#[tokio::test]
async fn test_failure_stops_later_levels() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("deployed");
    let pipeline = Pipeline::new("stop")
        .with_step(shell_step("build", "true", &[]))
        .with_step(shell_step("test", "exit 1", &["build"]))
        .with_step(shell_step("deploy", &format!("touch {}", marker.display()), &["test"]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "test", ActionErrorKind::CommandFailed);
    assert_not_started(&result, "deploy");
    assert!(!marker.exists());
    assert_eq!(result.report.total_steps, 3);
    assert_eq!(result.report.results.len(), 2);
}

/// The pipeline's own toolchain is used; compile failures keep their kind
#[tokio::test]
async fn test_compile_failure_kind() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Compile"
toolchain:
  program: "false"
steps:
  - id: "build"
    action:
      type: compile
      source: "main.zig"
      output: "app"
      optimize: ReleaseFast
"#,
    );

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "build", ActionErrorKind::CompileFailed);
    assert!(result.log_of("build").contains("$ false build-exe main.zig -O ReleaseFast --name app"));
}
