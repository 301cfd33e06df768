//! Worktree Status - Query and watch the git status of a working tree
//!
//! Run with `worktree-status` or `worktree-status --help` for usage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use worktree_status::{APP_NAME, Config, OpenOptions, Repository, StatusFlags, VERSION};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Cached working-tree git status with change notifications")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', value_name = "PATH")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh everything and list paths that are not current
    Status {
        /// Print the status map as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh and print the status of one file
    Path { file: PathBuf },

    /// Print the combined status of everything under a directory
    Dir { dir: PathBuf },

    /// Whether a file is ignored
    Ignored { file: PathBuf },

    /// Discard index and working-tree changes to a file
    Checkout { file: PathBuf },

    /// Print the current branch
    Branch,

    /// Refresh periodically and report changes until interrupted
    Watch {
        /// Refresh interval in milliseconds
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
    },

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        // Use info level for our crate, warn for dependencies
        EnvFilter::new("info")
            .add_directive("gix=warn".parse()?)
            .add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Resolve a command-line path against the working directory
fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn describe(status: StatusFlags) -> &'static str {
    if status.is_current() {
        "current"
    } else if Repository::is_status_ignored(status) {
        "ignored"
    } else if Repository::is_status_new(status) {
        "new"
    } else if Repository::is_status_deleted(status) {
        "deleted"
    } else if Repository::is_status_modified(status) {
        "modified"
    } else {
        "staged"
    }
}

async fn print_status(repo: &Repository, json: bool) -> Result<()> {
    let refresh = repo.refresh_status().await?;
    if let Err(e) = &refresh.branch {
        debug!("No branch: {}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&refresh.snapshot)?);
        return Ok(());
    }

    if let Ok(branch) = &refresh.branch {
        println!("On branch {}", branch);
    }
    let entries: Vec<_> = refresh
        .snapshot
        .sorted()
        .into_iter()
        .filter(|(_, status)| !status.is_current())
        .collect();
    if entries.is_empty() {
        println!("Working tree clean");
    }
    for (path, status) in entries {
        println!("{} {}", status, path);
    }
    Ok(())
}

async fn watch(repo: &Repository, interval: Duration) -> Result<()> {
    let statuses = repo.on_did_change_statuses({
        let repo = repo.clone();
        move || {
            let snapshot = repo.get_cached_statuses();
            let dirty = snapshot.iter().filter(|(_, s)| !s.is_current()).count();
            println!("Statuses changed: {} paths not current", dirty);
        }
    });

    info!("Watching every {:?}, press Ctrl-C to stop", interval);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = repo.refresh_status().await {
                    warn!("Refresh failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    statuses.dispose();
    repo.destroy();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(cli.debug || config.debug, config.log_file.as_deref())?;

    let cwd = std::env::current_dir()?;
    let base = match &cli.directory {
        Some(dir) => absolute(&cwd, dir),
        None => cwd,
    };

    if let Commands::Config { init } = cli.command {
        if init {
            config.save()?;
            println!(
                "Configuration initialized at {:?}",
                Config::config_file_path()?
            );
        } else {
            println!("Configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
            println!("\nConfig file: {:?}", Config::config_file_path()?);
        }
        return Ok(());
    }

    let repo = Repository::open_with_git(&base, &config, OpenOptions::from_config(&config));
    debug!("Repository at {:?}", repo.get_working_directory().await?);

    match cli.command {
        Commands::Status { json } => print_status(&repo, json).await?,

        Commands::Path { file } => {
            let status = repo.get_path_status(absolute(&base, &file)).await?;
            println!("{} {}", describe(status), file.display());
        }

        Commands::Dir { dir } => {
            let status = repo.get_directory_status(absolute(&base, &dir)).await?;
            println!("{} {}", describe(status), dir.display());
        }

        Commands::Ignored { file } => {
            let ignored = repo.is_path_ignored(absolute(&base, &file)).await?;
            println!("{}", ignored);
        }

        Commands::Checkout { file } => {
            let status = repo.checkout_head(absolute(&base, &file)).await?;
            println!("Restored {} ({})", file.display(), describe(status));
        }

        Commands::Branch => println!("{}", repo.get_short_head().await?),

        Commands::Watch { interval_ms } => {
            watch(&repo, Duration::from_millis(interval_ms.max(1))).await?
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
