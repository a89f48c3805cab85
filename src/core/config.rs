//! Pipeline configuration from YAML

use crate::core::{action::Action, condition::Condition, step::Step, Pipeline};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

static STEP_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid step id pattern"));

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Pipeline description (optional)
    #[serde(default)]
    pub description: Option<String>,

    /// Global environment available to all steps
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Toolchain used by compile and test actions
    #[serde(default)]
    pub toolchain: Option<ToolchainConfig>,

    /// Pipeline steps
    pub steps: Vec<StepConfig>,
}

/// Toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Program invoked for builds and tests
    pub program: String,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,

    /// The action this step performs
    pub action: Action,

    /// List of step IDs this step depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Step-scoped environment
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Run condition
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl StepConfig {
    pub fn to_step(&self) -> Step {
        Step {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            action: self.action.clone(),
            dependencies: self.depends_on.clone(),
            env: self.env.clone(),
            condition: self.condition.clone(),
        }
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate step identifiers.
    ///
    /// Dependency resolution and cycle detection happen at plan time.
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if step.id.is_empty() {
                anyhow::bail!("Step id must not be empty");
            }
            if !STEP_ID.is_match(&step.id) {
                anyhow::bail!(
                    "Step id '{}' may only contain letters, digits, '_' and '-'",
                    step.id
                );
            }
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                anyhow::bail!("Invalid environment variable name: '{}'", key);
            }
        }

        Ok(())
    }

    /// Overlay pipeline-level environment entries (e.g. from the command line)
    pub fn apply_env_overrides(&mut self, overrides: &[(String, String)]) {
        for (key, value) in overrides {
            self.env.insert(key.clone(), value.clone());
        }
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}
