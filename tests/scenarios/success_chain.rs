//! Test: Success Chain - dependent levels run in order

use crate::helpers::*;
use stepflow::core::StepStatus;
use stepflow::ExecutionStatus;

#[tokio::test]
async fn test_diamond_runs_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().display().to_string();
    let pipeline = stepflow::Pipeline::new("diamond")
        .with_step(shell_step("fetch", &format!("echo fetched > {}/fetch", out), &[]))
        .with_step(shell_step("lint", &format!("cat {}/fetch && touch {}/lint", out, out), &["fetch"]))
        .with_step(shell_step("unit", &format!("cat {}/fetch && touch {}/unit", out, out), &["fetch"]))
        .with_step(shell_step(
            "package",
            &format!("test -f {}/lint && test -f {}/unit && echo packaged", out, out),
            &["lint", "unit"],
        ));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_succeeded(&result);
    assert_eq!(result.report.status, ExecutionStatus::Completed);
    assert_eq!(result.report.count(StepStatus::Success), 4);
    assert_eq!(result.log_order(), vec!["fetch", "lint", "unit", "package"]);
    assert!(result.log_of("lint").contains("fetched"));
    assert!(result.log_of("package").contains("packaged"));
}

/// Both members of a level run at the same time
#[tokio::test]
async fn test_level_members_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().display().to_string();
    // Each side waits for the other's marker, which only works if both are running.
    let left = format!(
        "touch {0}/left; for i in $(seq 1 50); do [ -f {0}/right ] && exit 0; sleep 0.1; done; exit 1",
        out
    );
    let right = format!(
        "touch {0}/right; for i in $(seq 1 50); do [ -f {0}/left ] && exit 0; sleep 0.1; done; exit 1",
        out
    );
    let pipeline = stepflow::Pipeline::new("overlap")
        .with_step(shell_step("left", &left, &[]))
        .with_step(shell_step("right", &right, &[]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_succeeded(&result);
}

#[tokio::test]
async fn test_logs_are_kept_under_log_dir() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = stepflow::Pipeline::new("kept").with_step(shell_step("hello", "echo hi", &[]));

    let result = run_with(engine().with_log_dir(dir.path()), &pipeline).await;

    let log_path = dir
        .path()
        .join(result.report.execution_id.to_string())
        .join("00-hello.log");
    assert!(std::fs::read_to_string(log_path).unwrap().contains("hi"));
}

/// Logs stay readable from the report once the temporary run dir is removed
#[tokio::test]
async fn test_report_logs_survive_run() {
    let pipeline = stepflow::Pipeline::new("report")
        .with_step(shell_step("ok", "echo visible", &[]))
        .with_step(shell_step("next", "echo later >&2", &["ok"]));

    let report = engine().plan_and_run(&pipeline).await.unwrap();

    let ok = report.result("ok").unwrap();
    assert!(!ok.log_path().exists());
    assert!(ok.read_log().contains("visible"));
    assert!(report.result("next").unwrap().read_log().contains("later"));
}
