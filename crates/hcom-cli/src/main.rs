//! Helm Commander CLI - better visibility into Helm deployments
//!
//! Read-only: every command inspects cluster state or local caches and
//! never mutates either.

use clap::{Parser, Subcommand};
use std::time::Duration;

mod commands;
mod error;
mod exit_codes;
mod output;

use error::CliError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "hcom")]
#[command(version)]
#[command(about = "Helm Commander - better visibility into Helm deployments", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (default: all namespaces)
    #[arg(short = 'n', long, global = true)]
    namespace: Option<String>,

    /// Kubeconfig context name
    #[arg(long, global = true)]
    context: Option<String>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Whole-invocation deadline in seconds
    #[arg(long, global = true, default_value_t = 60)]
    timeout: u64,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List Helm releases
    List {
        /// Regex filter on release or chart name
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Status category: deployed, failed, pending, problematic
        #[arg(long)]
        only: Option<String>,

        /// Exact status match (case-insensitive)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show release details
    Info {
        /// Release name
        name: String,

        /// Include user-supplied values
        #[arg(long)]
        show_values: bool,
    },

    /// Show release revision history
    History {
        /// Release name
        name: String,

        /// Limit the number of revisions shown
        #[arg(long)]
        max: Option<usize>,
    },

    /// Detect configuration drift against live cluster state
    Drift {
        /// Release name
        name: String,
    },

    /// Detect the chart's source repository
    Source {
        /// Release name
        name: String,
    },

    /// Check for chart updates in local repo caches
    Updates {
        /// Regex filter on release or chart name
        #[arg(short = 'f', long)]
        filter: Option<String>,
    },

    /// Run cross-release diagnostic checks
    Doctor {
        /// Minutes before a pending operation counts as stuck
        #[arg(long)]
        stuck_minutes: Option<i64>,

        /// Stored revisions per release before flagging bloat
        #[arg(long)]
        bloat: Option<usize>,
    },
}

/// Flags shared by every command
pub struct Global {
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub output: OutputFormat,
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    let deadline = Duration::from_secs(cli.timeout);
    let timeout_secs = cli.timeout;

    let code = match tokio::time::timeout(deadline, dispatch(cli)).await {
        Ok(Ok(code)) => code,
        Ok(Err(err)) => {
            eprintln!("{:?}", miette::Report::new(err.clone()));
            err.exit_code()
        }
        Err(_) => {
            eprintln!("partial: invocation deadline of {}s exceeded", timeout_secs);
            exit_codes::PARTIAL
        }
    };
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let global = Global {
        namespace: cli.namespace,
        context: cli.context,
        output: cli.output,
    };

    match cli.command {
        Commands::List {
            filter,
            only,
            status,
        } => commands::list::run(&global, filter.as_deref(), only.as_deref(), status).await,

        Commands::Info { name, show_values } => {
            commands::info::run(&global, &name, show_values).await
        }

        Commands::History { name, max } => commands::history::run(&global, &name, max).await,

        Commands::Drift { name } => commands::drift::run(&global, &name).await,

        Commands::Source { name } => commands::source::run(&global, &name).await,

        Commands::Updates { filter } => commands::updates::run(&global, filter.as_deref()).await,

        Commands::Doctor {
            stuck_minutes,
            bloat,
        } => commands::doctor::run(&global, stuck_minutes, bloat).await,
    }
}

fn init_logging(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(debug)
        .init();
}
