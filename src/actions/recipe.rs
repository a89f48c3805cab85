//! Recipe handlers - named, pluggable actions beyond the built-ins

use crate::actions::recipes::{CacheRecipe, DockerRecipe, HttpRecipe, SlackRecipe};
use crate::core::ActionError;
use crate::execution::StepLog;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters handed to a recipe, exactly as written in the pipeline
pub type RecipeParams = HashMap<String, String>;

/// A recipe receives its parameters and a writable log, nothing else
#[async_trait]
pub trait RecipeHandler: Send + Sync {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError>;
}

/// Name to handler lookup, consulted when a recipe step is dispatched
#[derive(Clone, Default)]
pub struct RecipeRegistry {
    handlers: HashMap<String, Arc<dyn RecipeHandler>>,
}

impl RecipeRegistry {
    /// An empty registry; every recipe resolves to `NotImplemented`
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the docker, cache, http and slack recipes
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("docker", DockerRecipe::default());
        registry.register("cache", CacheRecipe::default());
        registry.register("http", HttpRecipe::default());
        registry.register("slack", SlackRecipe::default());
        registry
    }

    /// Register (or replace) a handler
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: RecipeHandler + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RecipeHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered recipe names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Fetch a parameter the recipe cannot run without
pub fn required<'a>(recipe: &str, params: &'a RecipeParams, key: &str) -> Result<&'a str, ActionError> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ActionError::MissingParameter {
            recipe: recipe.to_string(),
            parameter: key.to_string(),
        })
}

pub fn optional<'a>(params: &'a RecipeParams, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Error for a recipe whose external tool exited unsuccessfully
pub fn tool_failed(recipe: &str, tool: &str, status: std::process::ExitStatus) -> ActionError {
    ActionError::RecipeFailed {
        recipe: recipe.to_string(),
        message: format!("{} exited with {}", tool, status),
    }
}
