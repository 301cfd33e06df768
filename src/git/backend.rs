//! Git backend using gitoxide and the git CLI
//!
//! gitoxide opens the repository and reads HEAD; status scans, ignore checks
//! and checkouts go through the `git` executable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use gix::ThreadSafeRepository;
use tracing::{debug, instrument};

use super::{Backend, BackendOpener, CheckoutStrategy, GitExecutor, StatusEntry, parse_porcelain};
use crate::config::Config;
use crate::error::{BackendError, Error, Result};

/// Git backend for one working tree
pub struct GitBackend {
    /// The gitoxide repository handle
    repo: ThreadSafeRepository,
    /// Path to the `.git` directory
    git_dir: PathBuf,
    /// Path to the working tree
    work_dir: PathBuf,
    /// Runs git subprocesses
    executor: GitExecutor,
}

fn open_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::Open {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

impl GitBackend {
    /// Discover the repository containing `path` (searches parent directories)
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn discover(path: impl AsRef<Path>, executor: GitExecutor) -> Result<Self> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|e| open_error(path, e.to_string()))?;

        let repo = gix::discover(&canonical).map_err(|e| open_error(path, e.to_string()))?;

        let work_dir = repo
            .work_dir()
            .map(Path::to_path_buf)
            .ok_or_else(|| open_error(path, "bare repository has no working directory"))?;
        let git_dir = repo.path().to_path_buf();

        debug!("Discovered repository at {:?}", work_dir);

        Ok(Self {
            repo: repo.into_sync(),
            git_dir,
            work_dir,
            executor,
        })
    }

    /// Get the repository name (working directory name)
    pub fn repo_name(&self) -> String {
        self.work_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

fn branch_name(repo: &gix::Repository) -> Result<String> {
    let head = repo.head().map_err(|e| BackendError::Gix(e.to_string()))?;

    match head.kind {
        gix::head::Kind::Symbolic(reference) => Ok(reference.name.shorten().to_string()),
        gix::head::Kind::Detached { .. } => {
            Err(BackendError::NoBranch("HEAD is detached".to_string()).into())
        }
        gix::head::Kind::Unborn(full_name) => Err(BackendError::NoBranch(format!(
            "branch '{}' has no commits yet",
            full_name.shorten()
        ))
        .into()),
    }
}

#[async_trait]
impl Backend for GitBackend {
    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn working_directory(&self) -> &Path {
        &self.work_dir
    }

    #[instrument(skip(self))]
    async fn list_statuses(&self, pathspec: Option<&str>) -> Result<Vec<StatusEntry>> {
        let mut args = vec!["status", "--porcelain=v1", "-z", "--untracked-files=all"];
        if let Some(pathspec) = pathspec.filter(|p| !p.is_empty()) {
            args.insert(0, "--literal-pathspecs");
            args.extend(["--", pathspec]);
        }

        let stdout = self.executor.run(&self.work_dir, &args).await?;
        let entries = parse_porcelain(&stdout)?;
        debug!("git status reported {} entries", entries.len());
        Ok(entries)
    }

    async fn current_branch(&self) -> Result<String> {
        let repo = self.repo.clone();
        tokio::task::spawn_blocking(move || branch_name(&repo.to_thread_local()))
            .await
            .map_err(BackendError::from)?
    }

    async fn is_ignored(&self, relative_path: &str) -> Result<bool> {
        let args = ["check-ignore", "-q", "--", relative_path];
        let output = self.executor.output(&self.work_dir, &args).await?;

        // check-ignore exits 0 when ignored, 1 when not
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(BackendError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into()),
        }
    }

    #[instrument(skip(self))]
    async fn checkout(&self, relative_paths: &[String], strategy: CheckoutStrategy) -> Result<()> {
        let mut args = Vec::with_capacity(relative_paths.len() + 5);
        if strategy.disable_pathspec_match {
            args.push("--literal-pathspecs");
        }
        args.push("checkout");
        if strategy.force {
            args.push("-f");
        }
        args.extend(["HEAD", "--"]);
        args.extend(relative_paths.iter().map(String::as_str));

        self.executor
            .run(&self.work_dir, &args)
            .await
            .map_err(|e| match e {
                Error::Backend(BackendError::CommandFailed { stderr, .. }) => {
                    BackendError::Checkout {
                        paths: relative_paths.to_vec(),
                        reason: stderr,
                    }
                    .into()
                }
                other => other,
            })?;

        debug!("Checked out {} path(s) from HEAD", relative_paths.len());
        Ok(())
    }
}

/// Opens [`GitBackend`]s with a shared executor
#[derive(Clone, Default)]
pub struct GitOpener {
    executor: GitExecutor,
}

impl GitOpener {
    pub fn new(executor: GitExecutor) -> Self {
        Self { executor }
    }

    /// Executor sized and timed from configuration
    pub fn from_config(config: &Config) -> Self {
        let executor = GitExecutor::with_max_concurrent(config.max_concurrent_commands)
            .with_timeout(config.command_timeout())
            .with_binary(config.git_binary.clone());
        Self::new(executor)
    }
}

#[async_trait]
impl BackendOpener for GitOpener {
    async fn open(&self, path: &Path) -> Result<Arc<dyn Backend>> {
        let path = path.to_path_buf();
        let executor = self.executor.clone();
        let backend = tokio::task::spawn_blocking(move || GitBackend::discover(path, executor))
            .await
            .map_err(BackendError::from)??;
        Ok(Arc::new(backend))
    }
}
