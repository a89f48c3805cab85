//! stepflow - declarative build pipelines run locally in dependency levels

pub mod actions;
pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use actions::{ActionDispatcher, RecipeHandler, RecipeRegistry};
pub use core::{Action, ActionError, ActionErrorKind, Condition, ExecutionStatus, Pipeline, PlanningError, RunOutcome, RunReport, Step};
pub use execution::{plan, ExecutionEngine, ExecutionEvent, ExecutionPlan};
