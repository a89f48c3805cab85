//! Pipeline domain model

use crate::core::{config::PipelineConfig, step::Step};
use std::collections::HashMap;

/// A pipeline definition. Step order is significant: it breaks ties when
/// steps are leveled and fixes the order results are reported in.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Optional description
    pub description: String,

    /// Pipeline steps in declaration order
    pub steps: Vec<Step>,

    /// Global environment available to all steps
    pub env: HashMap<String, String>,

    /// Program used by compile and test actions
    pub toolchain: String,
}

/// Toolchain program used when a pipeline does not name one
pub const DEFAULT_TOOLCHAIN: &str = "zig";

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            env: HashMap::new(),
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
        }
    }

    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        let steps = config.steps.iter().map(|s| s.to_step()).collect();

        Pipeline {
            name: config.name.clone(),
            description: config.description.clone().unwrap_or_default(),
            steps,
            env: config.env.clone(),
            toolchain: config
                .toolchain
                .as_ref()
                .map(|t| t.program.clone())
                .unwrap_or_else(|| DEFAULT_TOOLCHAIN.to_string()),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of a step in declaration order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Action;

    fn shell(cmd: &str) -> Action {
        Action::Shell {
            command: cmd.to_string(),
            working_dir: None,
        }
    }

    #[test]
    fn test_lookup_preserves_declaration_order() {
        let pipeline = Pipeline::new("demo")
            .with_step(Step::new("b", shell("true")))
            .with_step(Step::new("a", shell("true")));

        assert_eq!(pipeline.index_of("b"), Some(0));
        assert_eq!(pipeline.index_of("a"), Some(1));
        assert!(pipeline.step("c").is_none());
    }

    #[test]
    fn test_from_config() {
        let yaml = r#"
name: "Test Pipeline"
description: "demo"
env:
  MODE: "ci"
toolchain:
  program: "/opt/zig/zig"
steps:
  - id: "step1"
    action:
      type: shell
      command: "echo hi"
  - id: "step2"
    name: "Second"
    depends_on: ["step1"]
    action:
      type: shell
      command: "echo there"
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        let pipeline = config.to_pipeline();

        assert_eq!(pipeline.name, "Test Pipeline");
        assert_eq!(pipeline.description, "demo");
        assert_eq!(pipeline.toolchain, "/opt/zig/zig");
        assert_eq!(pipeline.env.get("MODE"), Some(&"ci".to_string()));
        assert_eq!(pipeline.steps[0].name, "step1");
        assert_eq!(pipeline.steps[1].dependencies, vec!["step1"]);
    }
}
