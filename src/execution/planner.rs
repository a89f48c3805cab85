//! Dependency graph planner - groups steps into concurrently runnable levels

use crate::core::{Pipeline, PlanningError};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// A set of steps with no unresolved dependency, runnable concurrently.
///
/// Indices refer to `Pipeline::steps` and are kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub steps: Vec<usize>,
}

impl Level {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Ordered levels covering every step exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    levels: Vec<Level>,
}

impl ExecutionPlan {
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    /// Level index of the step at `step_index`
    pub fn level_of(&self, step_index: usize) -> Option<usize> {
        self.levels.iter().position(|level| level.steps.contains(&step_index))
    }

    /// True if this plan can drive `pipeline`: every step appears exactly
    /// once and sits in a later level than each of its dependencies.
    pub fn fits(&self, pipeline: &Pipeline) -> bool {
        let count = pipeline.steps.len();
        let mut level_of = vec![None; count];
        for (level_index, level) in self.levels.iter().enumerate() {
            for &i in &level.steps {
                match level_of.get_mut(i) {
                    Some(slot) if slot.is_none() => *slot = Some(level_index),
                    _ => return false,
                }
            }
        }
        if level_of.iter().any(Option::is_none) {
            return false;
        }

        pipeline.steps.iter().enumerate().all(|(i, step)| {
            step.dependencies.iter().all(|dep| {
                pipeline
                    .index_of(dep)
                    .is_some_and(|d| level_of[d] < level_of[i])
            })
        })
    }

    /// Levels rendered as step ids
    pub fn step_ids(&self, pipeline: &Pipeline) -> Vec<Vec<String>> {
        self.levels
            .iter()
            .map(|level| {
                level
                    .steps
                    .iter()
                    .map(|&i| pipeline.steps[i].id.clone())
                    .collect()
            })
            .collect()
    }
}

/// Compute the execution plan for a pipeline.
///
/// Each round takes every unprocessed step whose dependencies are all
/// processed, in declaration order. Nothing is returned on error.
pub fn plan(pipeline: &Pipeline) -> Result<ExecutionPlan, PlanningError> {
    if pipeline.steps.is_empty() {
        return Err(PlanningError::EmptyPipeline);
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(pipeline.steps.len());
    for (i, step) in pipeline.steps.iter().enumerate() {
        if index.insert(step.id.as_str(), i).is_some() {
            return Err(PlanningError::DuplicateStepId { id: step.id.clone() });
        }
    }

    let count = pipeline.steps.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    for (i, step) in pipeline.steps.iter().enumerate() {
        let mut resolved: Vec<usize> = Vec::with_capacity(step.dependencies.len());
        for dep in &step.dependencies {
            let &dep_index = index.get(dep.as_str()).ok_or_else(|| PlanningError::InvalidDependency {
                step: step.id.clone(),
                dependency: dep.clone(),
            })?;
            if !resolved.contains(&dep_index) {
                resolved.push(dep_index);
            }
        }
        in_degree[i] = resolved.len();
        for dep_index in resolved {
            dependents[dep_index].push(i);
        }
    }

    let mut processed = vec![false; count];
    let mut remaining = count;
    let mut levels = Vec::new();

    while remaining > 0 {
        let ready: Vec<usize> = (0..count)
            .filter(|&i| !processed[i] && in_degree[i] == 0)
            .collect();

        if ready.is_empty() {
            let steps = (0..count)
                .filter(|&i| !processed[i])
                .map(|i| pipeline.steps[i].id.clone())
                .collect();
            return Err(PlanningError::CircularDependency { steps });
        }

        for &i in &ready {
            processed[i] = true;
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
            }
        }
        remaining -= ready.len();

        debug!("Planned level {} with {} step(s)", levels.len(), ready.len());
        levels.push(Level { steps: ready });
    }

    Ok(ExecutionPlan { levels })
}
