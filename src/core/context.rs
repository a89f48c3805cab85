//! Step environment - layering of process, pipeline and step variables

use crate::core::{Pipeline, Step};
use std::collections::HashMap;

/// Snapshot of the current process environment.
///
/// Entries whose name or value is not valid UTF-8 are left out. Conditions
/// compare values as text, and built-in actions start children from exactly
/// this map, so such variables are not visible to steps at all. Export a
/// UTF-8 copy under another name if a step needs one.
pub fn process_environment() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Per-step execution context.
///
/// Every concurrently running step owns its own copy; nothing in here is
/// shared between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// The step being executed
    pub step_id: String,

    /// Process environment overlaid by pipeline globals, then by step entries
    pub env: HashMap<String, String>,
}

impl StepContext {
    /// Build the context for `step`, merging on top of `base`
    pub fn for_step(base: &HashMap<String, String>, pipeline: &Pipeline, step: &Step) -> Self {
        Self {
            step_id: step.id.clone(),
            env: merge_environment(base, &pipeline.env, &step.env),
        }
    }
}

/// Merge environment layers; later layers win on key collision
pub fn merge_environment(
    base: &HashMap<String, String>,
    globals: &HashMap<String, String>,
    step: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = base.clone();
    merged.extend(globals.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.extend(step.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
