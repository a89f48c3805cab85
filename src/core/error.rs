//! Error types for planning and step execution

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors detected while turning a pipeline into an execution plan.
///
/// All of these are raised before any process is started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("pipeline has no steps")]
    EmptyPipeline,

    #[error("duplicate step id '{id}'")]
    DuplicateStepId { id: String },

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    InvalidDependency { step: String, dependency: String },

    #[error("circular dependency between steps: {}", steps.join(", "))]
    CircularDependency { steps: Vec<String> },
}

/// Errors produced by a single step's action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("command failed ({})", describe_exit(*code))]
    CommandFailed { code: Option<i32> },

    #[error("compilation failed ({})", describe_exit(*code))]
    CompileFailed { code: Option<i32> },

    #[error("tests failed ({})", describe_exit(*code))]
    TestsFailed { code: Option<i32> },

    #[error("checkout failed ({})", describe_exit(*code))]
    CheckoutFailed { code: Option<i32> },

    #[error("recipe '{recipe}' is not implemented")]
    NotImplemented { recipe: String },

    #[error("recipe '{recipe}' requires parameter '{parameter}'")]
    MissingParameter { recipe: String, parameter: String },

    #[error("recipe '{recipe}' failed: {message}")]
    RecipeFailed { recipe: String, message: String },

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of an [`ActionError`], cheap to copy into results and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionErrorKind {
    CommandFailed,
    CompileFailed,
    TestsFailed,
    CheckoutFailed,
    NotImplemented,
    MissingParameter,
    RecipeFailed,
    Io,
}

impl ActionError {
    pub fn kind(&self) -> ActionErrorKind {
        match self {
            ActionError::CommandFailed { .. } => ActionErrorKind::CommandFailed,
            ActionError::CompileFailed { .. } => ActionErrorKind::CompileFailed,
            ActionError::TestsFailed { .. } => ActionErrorKind::TestsFailed,
            ActionError::CheckoutFailed { .. } => ActionErrorKind::CheckoutFailed,
            ActionError::NotImplemented { .. } => ActionErrorKind::NotImplemented,
            ActionError::MissingParameter { .. } => ActionErrorKind::MissingParameter,
            ActionError::RecipeFailed { .. } => ActionErrorKind::RecipeFailed,
            ActionError::Io(_) => ActionErrorKind::Io,
        }
    }
}

impl fmt::Display for ActionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionErrorKind::CommandFailed => "CommandFailed",
            ActionErrorKind::CompileFailed => "CompileFailed",
            ActionErrorKind::TestsFailed => "TestsFailed",
            ActionErrorKind::CheckoutFailed => "CheckoutFailed",
            ActionErrorKind::NotImplemented => "NotImplemented",
            ActionErrorKind::MissingParameter => "MissingParameter",
            ActionErrorKind::RecipeFailed => "RecipeFailed",
            ActionErrorKind::Io => "FilesystemError",
        };
        f.write_str(name)
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}
