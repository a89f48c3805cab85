//! Test: Recipes - registry dispatch from pipeline steps

use crate::helpers::*;
use async_trait::async_trait;
use std::collections::HashMap;
use stepflow::actions::RecipeParams;
use stepflow::core::{ActionError, StepStatus};
use stepflow::execution::StepLog;
use stepflow::{Action, ActionDispatcher, ActionErrorKind, ExecutionEngine, Pipeline, RecipeHandler, RecipeRegistry, Step};

struct Greet;

#[async_trait]
impl RecipeHandler for Greet {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let who = params.get("who").ok_or_else(|| ActionError::MissingParameter {
            recipe: "greet".to_string(),
            parameter: "who".to_string(),
        })?;
        log.line(&format!("hello {}", who))?;
        Ok(())
    }
}

fn recipe_step(id: &str, recipe: &str, params: &[(&str, &str)]) -> Step {
    let params: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Step::new(
        id,
        Action::Recipe {
            recipe: recipe.to_string(),
            params,
        },
    )
}

fn engine_with(registry: RecipeRegistry) -> ExecutionEngine {
    ExecutionEngine::new(ActionDispatcher::new(registry)).with_base_env(base_env())
}

#[tokio::test]
async fn test_unknown_recipe_is_not_implemented() {
    let pipeline = Pipeline::new("recipes").with_step(recipe_step("publish", "pypi", &[]));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_failed_at(&result, "publish", ActionErrorKind::NotImplemented);
    assert!(result.log_of("publish").contains("pypi"));
}

#[tokio::test]
async fn test_registered_recipe_runs() {
    let mut registry = RecipeRegistry::new();
    registry.register("greet", Greet);
    let pipeline = Pipeline::new("recipes")
        .with_step(recipe_step("hello", "greet", &[("who", "world")]))
        .with_step(shell_step("after", "true", &["hello"]));

    let result = run_with(engine_with(registry), &pipeline).await;

    assert_pipeline_succeeded(&result);
    assert!(result.log_of("hello").contains("hello world"));
    assert_step_status(&result, "after", StepStatus::Success);
}

#[tokio::test]
async fn test_missing_recipe_parameter() {
    let mut registry = RecipeRegistry::new();
    registry.register("greet", Greet);
    let pipeline = Pipeline::new("recipes").with_step(recipe_step("hello", "greet", &[]));

    let result = run_with(engine_with(registry), &pipeline).await;

    assert_pipeline_failed_at(&result, "hello", ActionErrorKind::MissingParameter);
}

/// Cache restore of an unknown key is a miss, not a failure
#[tokio::test]
async fn test_builtin_cache_miss() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new("cache").with_step(recipe_step(
        "restore",
        "cache",
        &[
            ("op", "restore"),
            ("key", "deps-v1"),
            ("dir", &dir.path().display().to_string()),
        ],
    ));

    let result = run_pipeline(&pipeline).await;

    assert_pipeline_succeeded(&result);
    assert!(result.log_of("restore").contains("cache miss"));
}
