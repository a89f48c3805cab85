//! Step run conditions and their evaluation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Decides whether a step's action runs. A missing condition means `Always`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    Never,
    EnvEquals { variable: String, value: String },
    EnvExists { variable: String },
    FileExists { path: String },
}

/// Read-only filesystem probe used by `FileExists`
pub trait FsProbe: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Probe backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FsProbe for LocalFs {
    fn exists(&self, path: &str) -> bool {
        // Dangling symlinks still count as an entry.
        Path::new(path).symlink_metadata().is_ok()
    }
}

impl Condition {
    /// Evaluate against an environment snapshot and a filesystem probe
    pub fn should_run(&self, env: &HashMap<String, String>, fs: &dyn FsProbe) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::EnvEquals { variable, value } => {
                env.get(variable).is_some_and(|current| current == value)
            }
            Condition::EnvExists { variable } => env.contains_key(variable),
            Condition::FileExists { path } => fs.exists(path),
        }
    }
}

/// Evaluate an optional condition; absent means the step always runs
pub fn should_run(condition: Option<&Condition>, env: &HashMap<String, String>, fs: &dyn FsProbe) -> bool {
    condition.map_or(true, |c| c.should_run(env, fs))
}
