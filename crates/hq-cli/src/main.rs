use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hq_intel::{IntelConfig, IntelError, IntelService};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hq")]
#[command(about = "Mission control for the agent fleet", long_about = None)]
struct Cli {
    /// State directory holding cron logs, goal files and plans (overrides HQ_STATE_DIR)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full mission control snapshot
    Snapshot,
    /// Intelligence for a single agent
    Agent { id: String },
    /// Current blocker alerts
    Blockers,
    /// Paged run history of one job, newest first
    Runs {
        job_id: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Run statistics across every job
    Stats,
    /// Per-agent health from the job registry and live sessions
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = IntelConfig::load_with_state_dir(cli.state_dir.clone())
        .context("Failed to load configuration")?;
    debug!(runs_dir = %config.runs_dir.display(), agents = config.roster.len(), "config loaded");
    let service = IntelService::from_config(config);

    match cli.command {
        Commands::Snapshot => print_json(&*service.snapshot().await.map_err(client_facing)?)?,
        Commands::Agent { id } => match service.agent_intelligence(&id).await {
            Ok(Some(agent)) => print_json(&agent)?,
            Ok(None) => {
                eprintln!("Agent not found");
                process::exit(1);
            }
            Err(err) if err.is_client_error() => {
                eprintln!("{}", err.public_message());
                process::exit(2);
            }
            Err(err) => return Err(client_facing(err)),
        },
        Commands::Blockers => print_json(&service.blockers().await.map_err(client_facing)?)?,
        Commands::Runs {
            job_id,
            limit,
            offset,
        } => match service.run_history(&job_id, limit, offset) {
            Ok(page) => print_json(&page)?,
            Err(err) => {
                eprintln!("{}", err.public_message());
                process::exit(2);
            }
        },
        Commands::Stats => print_json(&service.fleet_run_stats())?,
        Commands::Status => print_json(&service.agent_statuses().await)?,
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

/// The detailed error has already been logged by the service.
fn client_facing(err: IntelError) -> anyhow::Error {
    anyhow::anyhow!(err.public_message())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let enabled = !matches!(
        std::env::var("HQ_LOG_STDERR").ok().as_deref(),
        Some("0") | Some("false") | Some("FALSE") | Some("no") | Some("NO")
    );
    if enabled {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
