//! Scenario-based tests for stepflow

mod conditions;
mod environment;
mod failure_handling;
mod planning;
mod recipes;
mod success_chain;
