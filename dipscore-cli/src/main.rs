//! Dipscore CLI - Command-line interface
//!
//! Commands:
//! - replay: Run a scripted tournament through the engine
//! - systems: List the registered scoring systems
//! - score: Score one centre-count distribution

mod replay_cmd;
mod score_cmd;
mod systems_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use replay_cmd::ReplayArgs;
use score_cmd::ScoreArgs;
use systems_cmd::SystemsArgs;

#[derive(Parser)]
#[command(name = "dipscore")]
#[command(about = "Diplomacy tournament scoring engine")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a tournament script and print the standings
    Replay(ReplayArgs),
    /// List scoring systems
    Systems(SystemsArgs),
    /// Score a final-year centre distribution
    Score(ScoreArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Replay(args) => replay_cmd::run(args),
        Commands::Systems(args) => systems_cmd::run(args),
        Commands::Score(args) => score_cmd::run(args),
    }
}

/// Logs go to stderr so JSON output stays clean
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
