//! Run-scoped log storage

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;

/// Directory holding every step log of one run.
///
/// A temporary directory is removed when this value is dropped, whichever
/// way the run ends. A persistent directory is left in place.
#[derive(Debug)]
pub enum RunDirectory {
    Temporary(TempDir),
    Persistent(PathBuf),
}

impl RunDirectory {
    /// Create a fresh temporary directory for this run
    pub fn temporary() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("stepflow-").tempdir()?;
        Ok(RunDirectory::Temporary(dir))
    }

    /// Use (and create if needed) a directory that outlives the run
    pub fn persistent(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        Ok(RunDirectory::Persistent(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            RunDirectory::Temporary(dir) => dir.path(),
            RunDirectory::Persistent(path) => path,
        }
    }

    /// Open a fresh log for the step at `index`
    pub fn create_log(&self, index: usize, step_id: &str) -> io::Result<StepLog> {
        StepLog::create(self.path().join(format!("{:02}-{}.log", index, step_id)))
    }
}

/// Append-only, per-step log sink.
///
/// Every append is flushed, so the contents are complete even when the step
/// fails halfway.
#[derive(Debug)]
pub struct StepLog {
    path: PathBuf,
    file: File,
}

impl StepLog {
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append raw bytes
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    /// Append a line of text
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(text.len() + 1);
        buf.push_str(text);
        buf.push('\n');
        self.append(buf.as_bytes())
    }

    /// A handle child processes can write stdout or stderr into
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }

    /// Read everything written so far
    pub fn contents(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}
