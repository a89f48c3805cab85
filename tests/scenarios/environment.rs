//! Test: Environment - layering and isolation between steps

use crate::helpers::*;
use stepflow::Pipeline;

/// Step entries beat pipeline entries, which beat the inherited environment
#[tokio::test]
async fn test_env_precedence() {
    let mut env = base_env();
    env.insert("TARGET".to_string(), "inherited".to_string());
    env.insert("KEEP".to_string(), "kept".to_string());

    let pipeline = Pipeline::new("layers")
        .with_env("TARGET", "pipeline")
        .with_step(shell_step("global", "echo target=$TARGET keep=$KEEP", &[]))
        .with_step(shell_step("local", "echo target=$TARGET", &[]).with_env("TARGET", "step"));

    let result = run_with(engine().with_base_env(env), &pipeline).await;

    assert_pipeline_succeeded(&result);
    assert!(result.log_of("global").contains("target=pipeline keep=kept"));
    assert!(result.log_of("local").contains("target=step"));
}

/// A step's env entries never reach its siblings or dependents
#[tokio::test]
async fn test_step_env_is_private() {
    let pipeline = Pipeline::new("isolated")
        .with_step(shell_step("writer", "echo secret=$SECRET", &[]).with_env("SECRET", "hunter2"))
        .with_step(shell_step("sibling", "echo secret=${SECRET:-unset}", &[]))
        .with_step(shell_step("reader", "echo secret=${SECRET:-unset}", &["writer"]));

    let result = run_pipeline(&pipeline).await;

    assert!(result.log_of("writer").contains("secret=hunter2"));
    assert!(result.log_of("sibling").contains("secret=unset"));
    assert!(result.log_of("reader").contains("secret=unset"));
}

/// Overrides from the command line land in the pipeline layer
#[tokio::test]
async fn test_yaml_env_with_overrides() {
    let mut config = stepflow::core::config::PipelineConfig::from_yaml(
        r#"
name: "Overrides"
env:
  MODE: "debug"
steps:
  - id: "show"
    action:
      type: shell
      command: "echo mode=$MODE"
"#,
    )
    .unwrap();
    config.apply_env_overrides(&[("MODE".to_string(), "release".to_string())]);

    let result = run_pipeline(&config.to_pipeline()).await;

    assert!(result.log_of("show").contains("mode=release"));
}

#[tokio::test]
async fn test_working_dir_is_per_step() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let before = std::env::current_dir().unwrap();

    let pipeline = Pipeline::new("cwd").with_step(stepflow::Step::new(
        "inside",
        stepflow::Action::Shell {
            command: "cat marker.txt".to_string(),
            working_dir: Some(dir.path().display().to_string()),
        },
    ));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_succeeded(&result);
    assert!(result.log_of("inside").contains("here"));
    assert_eq!(std::env::current_dir().unwrap(), before);
}
