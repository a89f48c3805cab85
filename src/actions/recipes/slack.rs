//! Slack recipe: post a message to an incoming webhook

use crate::actions::process::Invocation;
use crate::actions::recipe::{optional, required, tool_failed, RecipeHandler, RecipeParams};
use crate::core::ActionError;
use crate::execution::StepLog;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const RECIPE: &str = "slack";

#[derive(Debug, Clone)]
pub struct SlackRecipe {
    program: String,
}

impl Default for SlackRecipe {
    fn default() -> Self {
        Self::with_program("curl")
    }
}

impl SlackRecipe {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Webhook payload; `channel` and `username` are passed through when set
    fn payload(params: &RecipeParams) -> Result<String, ActionError> {
        let mut payload = json!({ "text": required(RECIPE, params, "message")? });
        for key in ["channel", "username"] {
            if let Some(value) = optional(params, key) {
                payload[key] = json!(value);
            }
        }
        Ok(payload.to_string())
    }
}

#[async_trait]
impl RecipeHandler for SlackRecipe {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let webhook = required(RECIPE, params, "webhook")?;
        let payload = Self::payload(params)?;

        let status = Invocation::new(&self.program)
            .args(["-sS", "--fail", "--max-time", "30", "-X", "POST"])
            .args(["-H", "Content-Type: application/json", "--data"])
            .arg(payload)
            .secret_arg(webhook)
            .timeout(Duration::from_secs(35))
            .run(log)
            .await?;

        if status.success() {
            log.line("")?;
            Ok(())
        } else {
            Err(tool_failed(RECIPE, &self.program, status))
        }
    }
}
