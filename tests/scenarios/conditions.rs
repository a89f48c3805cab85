//! Test: Conditions - skipped steps and their dependents

use crate::helpers::*;
use std::collections::HashMap;
use stepflow::core::{Condition, StepStatus};
use stepflow::Pipeline;

/// A skipped step does not block what depends on it
#[tokio::test]
async fn test_never_step_lets_dependents_run() {
    let pipeline = Pipeline::new("skip")
        .with_step(shell_step("optional", "exit 1", &[]).with_condition(Condition::Never))
        .with_step(shell_step("next", "echo next ran", &["optional"]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_succeeded(&result);
    assert_step_status(&result, "optional", StepStatus::Skipped);
    assert_step_status(&result, "next", StepStatus::Success);
    assert!(result.log_of("next").contains("next ran"));
}

#[tokio::test]
async fn test_env_condition_from_yaml() {
    let pipeline = pipeline_from_yaml(
        r#"
name: "Branch gated"
steps:
  - id: "deploy"
    condition:
      when: env_equals
      variable: "BRANCH"
      value: "main"
    action:
      type: shell
      command: "echo deploying"
  - id: "notify"
    condition:
      when: env_exists
      variable: "WEBHOOK"
    action:
      type: shell
      command: "echo notifying"
"#,
    );

    let mut env = base_env();
    env.insert("BRANCH".to_string(), "main".to_string());
    let result = run_with(engine().with_base_env(env), &pipeline).await;

    assert_step_status(&result, "deploy", StepStatus::Success);
    assert_step_status(&result, "notify", StepStatus::Skipped);
}

/// Conditions read the inherited environment, not pipeline entries
#[tokio::test]
async fn test_condition_ignores_pipeline_env() {
    let pipeline = Pipeline::new("gated")
        .with_env("RELEASE", "1")
        .with_step(shell_step("publish", "true", &[]).with_condition(Condition::EnvExists {
            variable: "RELEASE".to_string(),
        }));

    let result = run_pipeline(&pipeline).await;

    assert_step_status(&result, "publish", StepStatus::Skipped);
}

#[tokio::test]
async fn test_file_exists_condition() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("Dockerfile");
    std::fs::write(&present, "FROM scratch\n").unwrap();

    let pipeline = Pipeline::new("files")
        .with_step(shell_step("has_file", "true", &[]).with_condition(Condition::FileExists {
            path: present.display().to_string(),
        }))
        .with_step(shell_step("no_file", "true", &[]).with_condition(Condition::FileExists {
            path: dir.path().join("missing").display().to_string(),
        }));

    let result = run_with(engine().with_base_env(HashMap::new()), &pipeline).await;

    assert_step_status(&result, "has_file", StepStatus::Success);
    assert_step_status(&result, "no_file", StepStatus::Skipped);
}
