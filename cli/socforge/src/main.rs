//! socforge CLI: dependency-resolving build driver for FPGA/SoC designs.

mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use socforge_registry::RegistryError;
use socforge_tools::ToolError;

use commands::sim::SimOptions;
use config::Workspace;

#[derive(Parser)]
#[command(name = "socforge", version, about = "Resolve, build and simulate IP-core based systems")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create socforge.toml with empty core and system directories
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<PathBuf>,
    },
    /// Build a system with a synthesis backend
    Build {
        system: String,
        /// Backend to use instead of the one the system declares
        #[arg(long)]
        backend: Option<String>,
        /// Print tool invocations without running them
        #[arg(long)]
        dry_run: bool,
    },
    /// Build and run a simulation
    Sim {
        /// Simulator to use instead of the system's first preference
        #[arg(long)]
        sim: Option<String>,
        /// Build the simulation without running it
        #[arg(long)]
        build_only: bool,
        /// Print tool invocations without running them
        #[arg(long)]
        dry_run: bool,
        /// System to simulate
        system: String,
        /// Arguments passed to the simulation
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List available cores and their cache status
    ListCores,
    /// List available systems
    ListSystems,
    /// List the simulators and backends socforge can drive
    ListStrategies,
    /// Show the dependency tree of a system
    Tree { system: String },
    /// Show the build plan of a system
    Plan {
        system: String,
        /// Strategy to plan for (default: the system's backend)
        #[arg(long)]
        strategy: Option<String>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove build directories
    Clean {
        /// Also remove build stamps from the artifact cache
        #[arg(long)]
        cache: bool,
        /// Only remove the build stamp of this core
        #[arg(long, conflicts_with = "cache")]
        core: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(exit_code(&e));
        }
    }
}

/// Run a command and return the process exit code.
fn run(cli: Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { path } => {
            let dir = path.map(|p| cwd.join(p)).unwrap_or_else(|| cwd.clone());
            commands::init::run(&dir)?;
        }

        Commands::Build {
            system,
            backend,
            dry_run,
        } => {
            let ws = Workspace::discover(&cwd)?;
            commands::build::run(&ws, &system, backend.as_deref(), dry_run)?;
        }

        Commands::Sim {
            sim,
            build_only,
            dry_run,
            system,
            args,
        } => {
            let ws = Workspace::discover(&cwd)?;
            let opts = SimOptions {
                simulator: sim.as_deref(),
                build_only,
                dry_run,
                args: &args,
            };
            if let Some(status) = commands::sim::run(&ws, &system, &opts)? {
                return Ok(commands::sim::exit_code(&status));
            }
        }

        Commands::ListCores => {
            let ws = Workspace::discover(&cwd)?;
            commands::list::cores(&ws.library()?);
        }

        Commands::ListSystems => {
            let ws = Workspace::discover(&cwd)?;
            commands::list::systems(&ws.library()?);
        }

        Commands::ListStrategies => commands::list::strategies(),

        Commands::Tree { system } => {
            let ws = Workspace::discover(&cwd)?;
            commands::tree::run(&ws.library()?, &system)?;
        }

        Commands::Plan {
            system,
            strategy,
            json,
        } => {
            let ws = Workspace::discover(&cwd)?;
            commands::plan::run(&ws.library()?, &system, strategy.as_deref(), json)?;
        }

        Commands::Clean { cache, core } => {
            let ws = Workspace::discover(&cwd)?;
            match core {
                Some(id) => commands::clean::core(&ws, &ws.library()?, &id)?,
                None => commands::clean::run(&ws, cache)?,
            }
        }
    }
    Ok(0)
}

/// Exit code for a failed command, taken from the first library error in
/// the chain.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<ToolError>() {
                Some(e.exit_code())
            } else {
                cause.downcast_ref::<RegistryError>().map(RegistryError::exit_code)
            }
        })
        .unwrap_or(1)
}
