//! Async git command executor with semaphore-controlled concurrency
//!
//! Provides non-blocking git subprocess execution with:
//! - Semaphore to limit concurrent commands
//! - Timeout handling
//! - Optional index locks disabled so status scans never contend with the user

use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{instrument, warn};

use crate::error::{BackendError, Result};

/// Default maximum concurrent git commands
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Async git command executor
#[derive(Clone)]
pub struct GitExecutor {
    /// Semaphore for concurrency control
    semaphore: Arc<Semaphore>,
    /// Command timeout
    timeout: Duration,
    /// Git executable
    binary: String,
}

impl GitExecutor {
    /// Create a new executor with default settings
    pub fn new() -> Self {
        Self::with_max_concurrent(DEFAULT_MAX_CONCURRENT)
    }

    /// Create an executor with custom concurrency limit
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout: DEFAULT_TIMEOUT,
            binary: "git".to_string(),
        }
    }

    /// Set the command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a different git executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run git in `cwd` and return the raw output, whatever the exit code
    #[instrument(skip(self, cwd))]
    pub async fn output(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BackendError::SemaphoreError)?;

        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(cwd)
            .args(args)
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!("git command failed to start: {}", e);
                Err(BackendError::CommandFailed {
                    command: self.describe(args),
                    stderr: e.to_string(),
                }
                .into())
            }
            Err(_) => Err(BackendError::Timeout(self.timeout).into()),
        }
    }

    /// Run git in `cwd`, failing on a non-zero exit code
    pub async fn run(&self, cwd: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.output(cwd, args).await?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(BackendError::CommandFailed {
                command: self.describe(args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into())
        }
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}
