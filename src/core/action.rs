//! Action domain model - the single unit of work a step performs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What a step does when it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Run a command through `sh -c`
    Shell {
        command: String,
        #[serde(default)]
        working_dir: Option<String>,
    },

    /// Build an executable with the configured toolchain
    Compile {
        source: String,
        output: String,
        #[serde(default)]
        optimize: OptimizeMode,
    },

    /// Run a test file with the configured toolchain
    Test {
        file: String,
        #[serde(default)]
        filter: Option<String>,
    },

    /// Shallow clone of a git repository
    Checkout {
        repository: String,
        #[serde(default)]
        branch: Option<String>,
        #[serde(default)]
        path: Option<String>,
    },

    /// Copy a file, creating the destination's parent directories
    Artifact {
        source: String,
        destination: String,
    },

    /// A named handler resolved against the recipe registry at dispatch time
    Recipe {
        recipe: String,
        #[serde(default)]
        params: HashMap<String, String>,
    },
}

impl Action {
    /// Short label used in logs and plan output
    pub fn label(&self) -> String {
        match self {
            Action::Shell { .. } => "shell".to_string(),
            Action::Compile { .. } => "compile".to_string(),
            Action::Test { .. } => "test".to_string(),
            Action::Checkout { .. } => "checkout".to_string(),
            Action::Artifact { .. } => "artifact".to_string(),
            Action::Recipe { recipe, .. } => format!("recipe:{}", recipe),
        }
    }
}

/// Optimization mode passed to the toolchain's build command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizeMode {
    #[default]
    Debug,
    ReleaseSafe,
    ReleaseFast,
    ReleaseSmall,
}

impl fmt::Display for OptimizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            OptimizeMode::Debug => "Debug",
            OptimizeMode::ReleaseSafe => "ReleaseSafe",
            OptimizeMode::ReleaseFast => "ReleaseFast",
            OptimizeMode::ReleaseSmall => "ReleaseSmall",
        };
        f.write_str(mode)
    }
}
