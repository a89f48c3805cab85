//! Step domain model

use crate::core::{action::Action, condition::Condition};
use std::collections::HashMap;

/// A single step in a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// The action this step performs
    pub action: Action,

    /// List of step IDs this step depends on
    pub dependencies: Vec<String>,

    /// Step-scoped environment, overrides pipeline globals
    pub env: HashMap<String, String>,

    /// Run condition (None = always)
    pub condition: Option<Condition>,
}

impl Step {
    /// Create a step with no dependencies, environment or condition
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            action,
            dependencies: Vec::new(),
            env: HashMap::new(),
            condition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}
