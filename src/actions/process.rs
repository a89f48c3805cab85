//! External process invocation with output captured into a step log

use crate::execution::StepLog;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// One external command: argv, environment, working directory and an
/// optional timeout.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    /// Replaces the inherited environment when set
    env: Option<HashMap<String, String>>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    /// Positions in `args` that are never written to the log
    secret: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
            working_dir: None,
            timeout: None,
            secret: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Argument passed to the program but shown as `***` in the log
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run with exactly this environment instead of inheriting ours
    pub fn env(mut self, env: &HashMap<String, String>) -> Self {
        self.env = Some(env.clone());
        self
    }

    /// Working directory of the child only; our own cwd is never changed
    pub fn current_dir(mut self, dir: Option<&str>) -> Self {
        self.working_dir = dir.map(PathBuf::from);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shell-like rendering of the command line for logs, secrets masked
    pub fn display(&self) -> String {
        let args = self
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| if self.secret.contains(&i) { "***" } else { arg.as_str() });
        std::iter::once(self.program.as_str())
            .chain(args)
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part.replace('\'', "'\\''"))
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the command and wait for it.
    ///
    /// Stdout and stderr both go straight into `log`. A non-zero exit is not
    /// an error here; callers map the returned status to their own failure.
    pub async fn run(&self, log: &mut StepLog) -> io::Result<ExitStatus> {
        log.line(&format!("$ {}", self.display()))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(std::process::Stdio::null())
            .stdout(log.stdio()?)
            .stderr(log.stdio()?)
            .kill_on_drop(true);

        if let Some(env) = &self.env {
            command.env_clear().envs(env);
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!("Spawning {}", self.display());
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                log.line(&format!("failed to start {}: {}", self.program, e))?;
                return Err(e);
            }
        };

        let status = match self.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("{} timed out after {}s", self.program, limit.as_secs());
                    child.kill().await.ok();
                    log.line(&format!("timed out after {}s", limit.as_secs()))?;
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("{} timed out after {}s", self.program, limit.as_secs()),
                    ));
                }
            },
            None => child.wait().await?,
        };

        if !status.success() {
            log.line(&format!("{} exited with {}", self.program, status))?;
        }

        debug!("{} finished with {}", self.program, status);
        Ok(status)
    }
}
