//! HTTP recipe: a single request through curl

use crate::actions::process::Invocation;
use crate::actions::recipe::{optional, required, tool_failed, RecipeHandler, RecipeParams};
use crate::core::ActionError;
use crate::execution::StepLog;
use async_trait::async_trait;
use std::io;
use std::time::Duration;

const RECIPE: &str = "http";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters: `url`, `method` (default GET), `body`, `output` (file to save
/// the response to) and `timeout` in seconds (default 30).
///
/// The timeout is enforced twice: curl's own `--max-time` and a hard limit on
/// the process a few seconds later. The body often carries credentials and is
/// masked in the step log.
#[derive(Debug, Clone)]
pub struct HttpRecipe {
    program: String,
}

impl Default for HttpRecipe {
    fn default() -> Self {
        Self::with_program("curl")
    }
}

impl HttpRecipe {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn timeout_secs(params: &RecipeParams) -> Result<u64, ActionError> {
        match optional(params, "timeout") {
            None => Ok(DEFAULT_TIMEOUT_SECS),
            Some(raw) => raw.parse::<u64>().map_err(|_| ActionError::RecipeFailed {
                recipe: RECIPE.to_string(),
                message: format!("invalid timeout '{}'", raw),
            }),
        }
    }

    fn invocation(&self, params: &RecipeParams) -> Result<Invocation, ActionError> {
        let url = required(RECIPE, params, "url")?;
        let method = optional(params, "method").unwrap_or("GET").to_uppercase();
        let timeout = Self::timeout_secs(params)?;

        let mut invocation = Invocation::new(&self.program)
            .args(["-sS", "--fail", "-X"])
            .arg(method)
            .arg("--max-time")
            .arg(timeout.to_string());
        if let Some(body) = optional(params, "body") {
            invocation = invocation.arg("--data").secret_arg(body);
        }
        if let Some(output) = optional(params, "output") {
            invocation = invocation.args(["-o", output]);
        }

        Ok(invocation
            .arg(url)
            .timeout(Duration::from_secs(timeout + 5)))
    }
}

#[async_trait]
impl RecipeHandler for HttpRecipe {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let status = match self.invocation(params)?.run(log).await {
            Ok(status) => status,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(ActionError::RecipeFailed {
                    recipe: RECIPE.to_string(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if status.success() {
            log.line("")?;
            Ok(())
        } else {
            Err(tool_failed(RECIPE, &self.program, status))
        }
    }
}
