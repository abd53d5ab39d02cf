//! Cirrus CLI - declarative CodeCommit repositories and Bedrock knowledge bases

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use commands::Context;
use error::Result;

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(author = "Cirrus Contributors")]
#[command(version)]
#[command(about = "Manage cloud resources from a declarative workspace file", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Workspace file
    #[arg(short = 'f', long = "file", global = true, env = "CIRRUS_CONFIG", default_value = "cirrus.yaml")]
    file: PathBuf,

    /// State file
    #[arg(long, global = true, env = "CIRRUS_STATE", default_value = cirrus_provider::DEFAULT_STATE_FILE)]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate resource blocks against their schemas
    Validate {
        /// Print canonical configurations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the changes apply would make
    Plan {
        /// Re-read remote objects into state before planning
        #[arg(long)]
        refresh: bool,

        /// Only report drift between state and remote objects
        #[arg(long, conflicts_with = "refresh")]
        refresh_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create, update and delete resources to match the workspace file
    Apply {
        /// Re-read remote objects into state before planning
        #[arg(long)]
        refresh: bool,
    },

    /// Take an existing remote object under management
    Import {
        /// Resource address, e.g. aws_codecommit_repository.main
        address: String,

        /// Remote identifier (repository name or knowledge base id)
        id: String,
    },

    /// Delete every resource in state
    Destroy {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Inspect the state file
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Print the JSON Schema of resource configurations
    Schema {
        /// Resource type (all types when omitted)
        #[arg(value_name = "TYPE")]
        resource_type: Option<String>,
    },

    /// List supported resource types
    Resources,
}

#[derive(Subcommand)]
enum StateCommands {
    /// List managed resources
    List,

    /// Show one managed resource
    Show {
        address: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CIRRUS_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(cli.file, cli.state);

    match cli.command {
        Commands::Validate { json } => commands::validate::run(&ctx, json),
        Commands::Plan {
            refresh,
            refresh_only,
            json,
        } => commands::plan::run(&ctx, refresh, refresh_only, json).await,
        Commands::Apply { refresh } => commands::apply::run(&ctx, refresh).await,
        Commands::Import { address, id } => commands::import::run(&ctx, &address, &id).await,
        Commands::Destroy { yes } => commands::destroy::run(&ctx, yes).await,
        Commands::State { command } => match command {
            StateCommands::List => commands::state::list(&ctx).await,
            StateCommands::Show { address, json } => {
                commands::state::show(&ctx, &address, json).await
            }
        },
        Commands::Schema { resource_type } => commands::schema::run(resource_type.as_deref()),
        Commands::Resources => commands::resources::run(),
    }
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };
    std::process::exit(code);
}
