//! Cache recipe: save or restore a directory as a keyed tarball

use crate::actions::process::Invocation;
use crate::actions::recipe::{optional, required, tool_failed, RecipeHandler, RecipeParams};
use crate::core::ActionError;
use crate::execution::StepLog;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

const RECIPE: &str = "cache";
const DEFAULT_CACHE_DIR: &str = ".stepflow-cache";

/// Parameters:
/// - `op`: `save` or `restore`
/// - `key`: archive name, letters, digits, `.`, `_` and `-` only
/// - `path`: what to archive, relative to `root` (save only)
/// - `root`: directory archived paths are relative to (default `.`)
/// - `dir`: where archives live (default `.stepflow-cache`)
///
/// Restoring a key that was never saved is a miss, not a failure.
#[derive(Debug, Clone)]
pub struct CacheRecipe {
    tar: String,
}

impl Default for CacheRecipe {
    fn default() -> Self {
        Self { tar: "tar".to_string() }
    }
}

impl CacheRecipe {
    fn archive_path(params: &RecipeParams) -> Result<PathBuf, ActionError> {
        let key = required(RECIPE, params, "key")?;
        let valid = key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(ActionError::RecipeFailed {
                recipe: RECIPE.to_string(),
                message: format!("invalid cache key '{}'", key),
            });
        }
        let dir = optional(params, "dir").unwrap_or(DEFAULT_CACHE_DIR);
        Ok(PathBuf::from(dir).join(format!("{}.tar.gz", key)))
    }

    async fn save(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let archive = Self::archive_path(params)?;
        let path = required(RECIPE, params, "path")?;
        let root = optional(params, "root").unwrap_or(".");

        if let Some(parent) = archive.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let archive = archive.to_string_lossy().into_owned();
        let status = Invocation::new(&self.tar)
            .args(["-czf", archive.as_str(), "-C", root, path])
            .run(log)
            .await?;
        if !status.success() {
            return Err(tool_failed(RECIPE, &self.tar, status));
        }

        info!("Saved cache {}", archive);
        log.line(&format!("cache saved: {}", archive))?;
        Ok(())
    }

    async fn restore(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        let archive = Self::archive_path(params)?;
        let root = optional(params, "root").unwrap_or(".");

        if !tokio::fs::try_exists(&archive).await? {
            log.line(&format!("cache miss: {}", archive.display()))?;
            return Ok(());
        }

        tokio::fs::create_dir_all(root).await?;
        let archive = archive.to_string_lossy().into_owned();
        let status = Invocation::new(&self.tar)
            .args(["-xzf", archive.as_str(), "-C", root])
            .run(log)
            .await?;
        if !status.success() {
            return Err(tool_failed(RECIPE, &self.tar, status));
        }

        log.line(&format!("cache restored: {}", archive))?;
        Ok(())
    }
}

#[async_trait]
impl RecipeHandler for CacheRecipe {
    async fn run(&self, params: &RecipeParams, log: &mut StepLog) -> Result<(), ActionError> {
        match required(RECIPE, params, "op")? {
            "save" => self.save(params, log).await,
            "restore" => self.restore(params, log).await,
            other => Err(ActionError::RecipeFailed {
                recipe: RECIPE.to_string(),
                message: format!("unknown op '{}'", other),
            }),
        }
    }
}
