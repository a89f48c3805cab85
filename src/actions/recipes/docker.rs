//! Docker recipe: build, push or run an image

use crate::actions::process::Invocation;
use crate::actions::recipe::{optional, required, tool_failed, RecipeHandler, RecipeParams};
use crate::core::ActionError;
use crate::execution::StepLog;
use async_trait::async_trait;

const RECIPE: &str = "docker";

/// Parameters:
/// - `op`: `build` (default), `push` or `run`
/// - build: `tag`, `context` (default `.`), `dockerfile`
/// - push: `tag`
/// - run: `image`, `command`
#[derive(Debug, Clone)]
pub struct DockerRecipe {
    program: String,
}

impl Default for DockerRecipe {
    fn default() -> Self {
        Self::with_program("docker")
    }
}

impl DockerRecipe {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn invocation(&self, params: &RecipeParams) -> Result<Invocation, ActionError> {
        let op = optional(params, "op").unwrap_or("build");
        let invocation = Invocation::new(&self.program);

        match op {
            "build" => {
                let tag = required(RECIPE, params, "tag")?;
                let mut invocation = invocation.args(["build", "-t", tag]);
                if let Some(dockerfile) = optional(params, "dockerfile") {
                    invocation = invocation.args(["-f", dockerfile]);
                }
                Ok(invocation.arg(optional(params, "context").unwrap_or(".")))
            }
            "push" => Ok(invocation.args(["push", required(RECIPE, params, "tag")?])),
            "run" => {
                let image = required(RECIPE, params, "image")?;
                let mut invocation = invocation.args(["run", "--rm", image]);
                if let Some(command) = optional(params, "command") {
                    invocation = invocation.args(["sh", "-c", command]);
                }
                Ok(invocation)
            }
            other => Err(ActionError::RecipeFailed {
                recipe: RECIPE.to_string(),
                message: format!("unknown op '{}'", other),
            }),
        }
    }
}

#[async_trait]
impl RecipeHandler for DockerRecipe {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let status = self.invocation(params)?.run(log).await?;
        if status.success() {
            Ok(())
        } else {
            Err(tool_failed(RECIPE, &self.program, status))
        }
    }
}
