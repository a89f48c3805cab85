//! Action dispatch - runs one step's action or recipe

pub mod builtin;
pub mod process;
pub mod recipe;
pub mod recipes;

pub use process::Invocation;
pub use recipe::{RecipeHandler, RecipeParams, RecipeRegistry};

use crate::core::{Action, ActionError};
use crate::execution::StepLog;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Executes actions. Built-ins map to one external process each; recipes
/// are looked up by name in the registry when the step runs.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    recipes: RecipeRegistry,
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(RecipeRegistry::with_builtins())
    }
}

impl ActionDispatcher {
    pub fn new(recipes: RecipeRegistry) -> Self {
        Self { recipes }
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    /// Run `action` with the step's merged environment, writing all output to `log`.
    ///
    /// Compile and test actions invoke `toolchain`. Artifact copies and
    /// recipes never see `env`.
    pub async fn execute(
        &self,
        action: &Action,
        toolchain: &str,
        env: &HashMap<String, String>,
        log: &mut StepLog,
    ) -> Result<(), ActionError> {
        debug!("Dispatching {} action", action.label());

        match action {
            Action::Shell { command, working_dir } => {
                builtin::shell(command, working_dir.as_deref(), env, log).await
            }
            Action::Compile {
                source,
                output,
                optimize,
            } => builtin::compile(toolchain, source, output, *optimize, env, log).await,
            Action::Test { file, filter } => {
                builtin::test(toolchain, file, filter.as_deref(), env, log).await
            }
            Action::Checkout {
                repository,
                branch,
                path,
            } => builtin::checkout(repository, branch.as_deref(), path.as_deref(), env, log).await,
            Action::Artifact { source, destination } => builtin::artifact(source, destination, log).await,
            Action::Recipe { recipe, params } => match self.recipes.get(recipe) {
                Some(handler) => handler.run(params, log).await,
                None => {
                    warn!("No handler registered for recipe '{}'", recipe);
                    log.line(&format!("recipe '{}' is not implemented", recipe))?;
                    Err(ActionError::NotImplemented {
                        recipe: recipe.clone(),
                    })
                }
            },
        }
    }
}
