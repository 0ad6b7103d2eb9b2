//! exo-conform - check an implementation's event encoding against golden vectors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{conform, encode, export};

#[derive(Parser)]
#[command(name = "exo-conform", version)]
#[command(about = "Run exo event golden vectors and report per-vector results")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    conform: ConformArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in registry as a vector file
    Export,
    /// Show canonical bytes and digest for one event record
    Encode {
        /// Event record JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ConformArgs {
    /// Vector files to run (default: the built-in registry)
    pub files: Vec<PathBuf>,
    /// Print each vector's digest instead of PASS
    #[arg(long)]
    pub digests: bool,
    /// Evaluate vectors on a blocking thread pool
    #[arg(long)]
    pub concurrent: bool,
    /// Evaluate superseded vectors instead of skipping them
    #[arg(long)]
    pub include_superseded: bool,
    /// Compare digests only, not canonical bytes
    #[arg(long)]
    pub skip_bytes: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Export) => export::run().map(|()| true),
        Some(Commands::Encode { input }) => encode::run(input).map(|()| true),
        None => conform::run(&cli.conform),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
