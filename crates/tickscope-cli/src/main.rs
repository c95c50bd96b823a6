//! tickscope CLI - live view of a simulation state stream.
//!
//! Single binary that provides:
//! - `tickscope view` - window rendering the stream (or a capture) live
//! - `tickscope tail` - headless reconciliation with one log line per message
//! - `tickscope replay` - headless replay of a capture with a summary
//! - `tickscope init` - write a default configuration file

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use tickscope_core::{RetainedSurface, ScopeConfig, Session};
use tickscope_stream::{StateStream, StreamEvent, DEFAULT_REPLAY_INTERVAL};

mod view;

#[derive(Parser)]
#[command(name = "tickscope")]
#[command(about = "Live top-down view of a simulation state stream", version)]
struct Cli {
    /// Project root directory (config is read from <project>/.tickscope/config.yaml)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Explicit config file, instead of the project one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a window showing the stream
    View {
        /// State stream endpoint (overrides config)
        #[arg(long, conflicts_with = "replay")]
        url: Option<String>,

        /// Play a JSONL capture instead of connecting
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Pacing between replayed messages
        #[arg(long, default_value_t = DEFAULT_REPLAY_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },

    /// Reconcile the stream headless and log every message
    Tail {
        /// State stream endpoint (overrides config)
        #[arg(long)]
        url: Option<String>,

        /// Stop after this many messages
        #[arg(long)]
        max_messages: Option<u64>,
    },

    /// Reconcile a JSONL capture headless and print a summary
    Replay {
        /// Capture file, one message per line
        file: PathBuf,
    },

    /// Write a default config to <project>/.tickscope/config.yaml
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Find project root
    let project_root = match cli.project {
        Some(project) => project,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::View {
            url,
            replay,
            interval_ms,
        } => {
            let config = load_config(cli.config.as_deref(), &project_root)?;
            let stream = match replay {
                Some(path) => open_replay(&path, Duration::from_millis(interval_ms))?,
                None => open_stream(url.as_deref().unwrap_or(&config.stream.url))?,
            };
            view::run(config, stream)
        }
        Commands::Tail { url, max_messages } => {
            let config = load_config(cli.config.as_deref(), &project_root)?;
            let mut stream = open_stream(url.as_deref().unwrap_or(&config.stream.url))?;
            let summary = consume(&config, &mut stream, max_messages, true)?;
            summary.print("Tail summary");
            Ok(())
        }
        Commands::Replay { file } => {
            let config = load_config(cli.config.as_deref(), &project_root)?;
            let mut stream = open_replay(&file, Duration::ZERO)?;
            let summary = consume(&config, &mut stream, None, false)?;
            summary.print("Replay summary");
            Ok(())
        }
        Commands::Init => init_project(&project_root),
    }
}

fn load_config(explicit: Option<&Path>, project_root: &Path) -> Result<ScopeConfig> {
    let config = match explicit {
        Some(path) => ScopeConfig::load(path)?,
        None => ScopeConfig::load_from_project(project_root)?,
    };
    tracing::debug!(
        project = %project_root.display(),
        world_extent = config.world_extent,
        url = %config.stream.url,
        "Loaded config"
    );
    Ok(config)
}

fn open_stream(url: &str) -> Result<StateStream> {
    tracing::info!(url = %url, "Opening state stream");
    StateStream::connect(url).with_context(|| format!("Cannot connect to {url}"))
}

fn open_replay(path: &Path, interval: Duration) -> Result<StateStream> {
    StateStream::replay(path, interval)
        .with_context(|| format!("Cannot open capture {}", path.display()))
}

struct Summary {
    session: Session,
    surface: RetainedSurface,
    close_reason: Option<String>,
}

/// Feeds every stream message through a fresh session until the stream closes (including a
/// worker that dies without closing) or `limit` messages were seen.
fn consume(
    config: &ScopeConfig,
    stream: &mut StateStream,
    limit: Option<u64>,
    log_each: bool,
) -> Result<Summary> {
    let mut session = Session::from_config(config).context("Invalid config")?;
    let mut surface = RetainedSurface::new(config.viewport);
    let mut received = 0u64;
    let mut close_reason = None;

    while limit.map_or(true, |limit| received < limit) {
        let Some(event) = stream.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };
        match event {
            StreamEvent::Opened => tracing::info!(source = %stream.source(), "Stream open"),
            StreamEvent::Message(text) => {
                received += 1;
                let outcome = session.handle_message(&text, &mut surface);
                let Some(report) = outcome.report().filter(|_| log_each) else {
                    continue;
                };
                tracing::info!(
                    tick = report.tick,
                    created = report.agents_created,
                    updated = report.agents_updated,
                    retired = report.retired,
                    agents = session.reconciler().agents().len(),
                    obstacles = session.reconciler().obstacles().len(),
                    "Reconciled"
                );
            }
            StreamEvent::Closed { reason } => {
                tracing::info!(reason = %reason, "Stream closed");
                close_reason = Some(reason);
                break;
            }
        }
    }

    Ok(Summary {
        session,
        surface,
        close_reason,
    })
}

impl Summary {
    fn print(&self, heading: &str) {
        let stats = self.session.stats();
        let reconciler = self.session.reconciler();

        println!("{heading}");
        println!("{}", "=".repeat(heading.len()));
        println!();
        println!("Messages applied: {}", stats.messages_applied);
        println!("Messages dropped: {}", stats.messages_dropped);
        println!("Entries ignored:  {}", stats.entries_ignored);
        println!(
            "Final tick:       {}",
            self.session
                .tick()
                .map_or_else(|| "-".to_string(), |tick| tick.to_string())
        );
        println!("Live agents:      {}", reconciler.agents().len());
        println!("Live obstacles:   {}", reconciler.obstacles().len());
        println!("Drawables:        {}", self.surface.len());
        if let Some(reason) = &self.close_reason {
            println!("Stream:           {reason}");
        }
    }
}

fn init_project(project_root: &Path) -> Result<()> {
    let scope_dir = project_root.join(".tickscope");
    std::fs::create_dir_all(&scope_dir)
        .with_context(|| format!("Failed to create {}", scope_dir.display()))?;

    let config_path = scope_dir.join("config.yaml");
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    let body = serde_yaml::to_string(&ScopeConfig::default())?;
    std::fs::write(&config_path, format!("# tickscope configuration\n\n{body}"))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Initialized tickscope config at {}", config_path.display());
    Ok(())
}
