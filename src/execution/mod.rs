//! Pipeline planning and execution

pub mod engine;
pub mod executor;
pub mod log;
pub mod planner;

pub use engine::{EngineError, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::StepExecutor;
pub use log::{RunDirectory, StepLog};
pub use planner::{plan, ExecutionPlan, Level};
