//! Built-in actions: shell, compile, test, checkout and artifact

use crate::actions::process::Invocation;
use crate::core::{ActionError, OptimizeMode};
use crate::execution::StepLog;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub async fn shell(
    command: &str,
    working_dir: Option<&str>,
    env: &HashMap<String, String>,
    log: &mut StepLog,
) -> Result<(), ActionError> {
    let status = Invocation::new("sh")
        .args(["-c", command])
        .env(env)
        .current_dir(working_dir)
        .run(log)
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(ActionError::CommandFailed { code: status.code() })
    }
}

pub async fn compile(
    toolchain: &str,
    source: &str,
    output: &str,
    optimize: OptimizeMode,
    env: &HashMap<String, String>,
    log: &mut StepLog,
) -> Result<(), ActionError> {
    info!("Compiling {} -> {} ({})", source, output, optimize);
    let status = Invocation::new(toolchain)
        .args(["build-exe", source, "-O"])
        .arg(optimize.to_string())
        .args(["--name", output])
        .env(env)
        .run(log)
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(ActionError::CompileFailed { code: status.code() })
    }
}

pub async fn test(
    toolchain: &str,
    file: &str,
    filter: Option<&str>,
    env: &HashMap<String, String>,
    log: &mut StepLog,
) -> Result<(), ActionError> {
    let mut invocation = Invocation::new(toolchain).args(["test", file]);
    if let Some(filter) = filter {
        invocation = invocation.args(["--test-filter", filter]);
    }

    let status = invocation.env(env).run(log).await?;
    if status.success() {
        Ok(())
    } else {
        Err(ActionError::TestsFailed { code: status.code() })
    }
}

pub async fn checkout(
    repository: &str,
    branch: Option<&str>,
    path: Option<&str>,
    env: &HashMap<String, String>,
    log: &mut StepLog,
) -> Result<(), ActionError> {
    let mut invocation = Invocation::new("git").args(["clone", "--depth", "1"]);
    if let Some(branch) = branch {
        invocation = invocation.args(["--branch", branch]);
    }
    invocation = invocation.arg(repository);
    if let Some(path) = path {
        invocation = invocation.arg(path);
    }

    let status = invocation.env(env).run(log).await?;
    if status.success() {
        Ok(())
    } else {
        Err(ActionError::CheckoutFailed { code: status.code() })
    }
}

/// Copy `source` to `destination`. Filesystem errors propagate unchanged.
pub async fn artifact(source: &str, destination: &str, log: &mut StepLog) -> Result<(), ActionError> {
    if let Some(parent) = Path::new(destination).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = tokio::fs::copy(source, destination).await?;
    log.line(&format!("copied {} -> {} ({} bytes)", source, destination, bytes))?;
    Ok(())
}
