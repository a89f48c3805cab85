//! Core domain models for Pipeline
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, their actions and run conditions, and the results
//! a run produces.

pub mod action;
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod step;

pub use action::*;
pub use condition::*;
pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
