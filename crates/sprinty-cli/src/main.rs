use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sprinty")]
#[command(version = "0.1.0")]
#[command(about = "Autonomous software-development orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Reset the circuit breaker to closed before running the command
    #[arg(long, global = true)]
    reset_circuit: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project's control-plane state
    Init {
        /// Project name
        project: String,

        /// Path to a product requirements document to seed the backlog from
        #[arg(long)]
        prd: Option<String>,
    },

    /// Run the orchestrator loop until it exits or halts
    Run,

    /// Show sprint/backlog/circuit-breaker status
    Status {
        /// Only print whether the project is done, and exit 0/1 accordingly
        #[arg(long)]
        check_done: bool,
    },

    /// Inspect or mutate the backlog
    #[command(subcommand)]
    Backlog(BacklogCommands),

    /// Print a point-in-time metrics snapshot
    Metrics,
}

#[derive(Subcommand)]
enum BacklogCommands {
    /// List all work items
    List {
        /// Filter by status (e.g. backlog, ready, done)
        #[arg(long)]
        status: Option<String>,
    },

    /// Add a new work item
    Add {
        /// Title of the work item
        title: String,

        /// Item type: feature, bug, spike, infra, chore
        #[arg(long, default_value = "feature")]
        r#type: String,

        /// Priority (lower integer = higher priority)
        #[arg(long, default_value_t = 3)]
        priority: i32,

        /// Story points
        #[arg(long, default_value_t = 1)]
        points: i32,

        /// Acceptance criteria, one per occurrence
        #[arg(long = "ac")]
        acceptance_criteria: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    sprinty_utils::init_logging(log_level);

    let root = std::env::current_dir()?;

    if cli.reset_circuit {
        commands::reset_circuit(&root)?;
    }

    let exit_code = match cli.command {
        Commands::Init { project, prd } => commands::init::run(&root, &project, prd.as_deref()).await?,
        Commands::Run => commands::run::run(&root).await?,
        Commands::Status { check_done } => commands::status::run(&root, check_done).await?,
        Commands::Backlog(BacklogCommands::List { status }) => commands::backlog::list(&root, status.as_deref()).await?,
        Commands::Backlog(BacklogCommands::Add { title, r#type, priority, points, acceptance_criteria }) => {
            commands::backlog::add(&root, &title, &r#type, priority, points, acceptance_criteria).await?
        }
        Commands::Metrics => commands::metrics::run(&root).await?,
    };

    std::process::exit(exit_code);
}
