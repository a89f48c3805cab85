//! Test: Planning - levels, ordering and graph errors

use crate::helpers::*;
use stepflow::{plan, PlanningError};

/// A fans out to B and C, which share a level in declaration order
#[test]
fn test_fan_out_levels() {
    let pipeline = dag(&[("A", &[]), ("B", &["A"]), ("C", &["A"])]);

    let levels = plan(&pipeline).unwrap().step_ids(&pipeline);

    assert_eq!(levels, vec![vec!["A"], vec!["B", "C"]]);
}

#[test]
fn test_cycle_is_rejected() {
    let pipeline = dag(&[("A", &["C"]), ("B", &["A"]), ("C", &["B"])]);

    match plan(&pipeline) {
        Err(PlanningError::CircularDependency { steps }) => {
            assert_eq!(steps, vec!["A", "B", "C"]);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_unknown_dependency_is_rejected() {
    let pipeline = dag(&[("A", &[]), ("D", &["Z"])]);

    let err = plan(&pipeline).unwrap_err();

    assert_eq!(
        err,
        PlanningError::InvalidDependency {
            step: "D".to_string(),
            dependency: "Z".to_string(),
        }
    );
    assert!(err.to_string().contains("'D'"));
    assert!(err.to_string().contains("'Z'"));
}

/// Planning errors come from the YAML path too, before anything runs
#[tokio::test]
async fn test_planning_error_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let pipeline = pipeline_from_yaml(&format!(
        r#"
name: "Broken graph"
steps:
  - id: "first"
    action:
      type: shell
      command: "touch {}"
  - id: "second"
    depends_on: ["missing"]
    action:
      type: shell
      command: "true"
"#,
        marker.display()
    ));

    let result = engine().plan_and_run(&pipeline).await;

    assert!(result.is_err());
    assert!(!marker.exists());
}
