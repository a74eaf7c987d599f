//! Black-box breadth-first explorer for prompt-driven text oracles.
//!
//! `explore` discovers every reachable state of the oracle up to a depth
//! bound; `verify` replays recorded paths from stdin and checks their
//! responses against expected patterns. The two modes are mutually
//! exclusive.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use explorer::core::report;
use explorer::exit_codes;
use explorer::explore::explore;
use explorer::io::config::{ExplorerConfig, load_config};
use explorer::io::oracle::PipeOracle;
use explorer::verify::{MismatchError, parse_records, verify};

#[derive(Parser)]
#[command(
    name = "explorer",
    version,
    about = "Breadth-first state-space explorer for interactive text programs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover reachable oracle states breadth-first and print reports.
    Explore(ExploreArgs),
    /// Replay recorded paths from stdin and verify expected responses.
    Verify(VerifyArgs),
}

#[derive(clap::Args)]
struct ExploreArgs {
    /// Oracle program and arguments.
    #[arg(required = true, num_args = 1.., value_name = "ORACLE")]
    oracle: Vec<String>,

    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of commands per path.
    #[arg(short = 'n', long, value_name = "N")]
    depth: Option<usize>,

    /// Maximum number of paths expanded before stopping.
    #[arg(long, value_name = "N")]
    steps: Option<usize>,

    /// Trace each expanded path on stdout.
    #[arg(short, long)]
    verbose: bool,

    /// Print unique locations discovered.
    #[arg(short, long)]
    locations: bool,

    /// Print items discovered.
    #[arg(short, long)]
    items: bool,

    /// Print successful paths discovered.
    #[arg(short, long)]
    paths: bool,

    /// Print paths with unknown responses.
    #[arg(short = 'r', long)]
    unknowns: bool,

    /// Print statistics (default when no section is selected).
    #[arg(short, long)]
    stats: bool,
}

#[derive(clap::Args)]
struct VerifyArgs {
    /// Oracle program and arguments.
    #[arg(required = true, num_args = 1.., value_name = "ORACLE")]
    oracle: Vec<String>,

    /// Path to a TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    explorer::logging::init();
    if let Err(err) = run() {
        if let Some(mismatch) = err.downcast_ref::<MismatchError>() {
            eprintln!("{mismatch}");
            std::process::exit(exit_codes::MISMATCH);
        }
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Explore(args) => cmd_explore(args),
        Command::Verify(args) => cmd_verify(args),
    }
}

fn cmd_explore(args: ExploreArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref(), &args.oracle)?;
    if let Some(depth) = args.depth {
        config.explore.max_depth = depth;
    }
    if let Some(steps) = args.steps {
        config.explore.max_steps = steps;
    }
    config.validate()?;

    let oracle = PipeOracle::new(config.oracle.clone());
    let verbose = args.verbose;
    let outcome = explore(&oracle, &config, |trace| {
        if verbose {
            println!(
                "considering {} (queue {}, step {})",
                trace.setup, trace.queue_len, trace.steps
            );
        }
    })?;

    let mut printed = false;
    if args.locations {
        print!("{}", report::render_locations(&outcome));
        printed = true;
    }
    if args.items {
        print!("{}", report::render_items(&outcome));
        printed = true;
    }
    if args.paths {
        print!("{}", report::render_paths(&outcome));
        printed = true;
    }
    if args.unknowns {
        print!("{}", report::render_unknowns(&outcome));
        printed = true;
    }
    if args.stats || !printed {
        print!("{}", report::render_stats(&outcome));
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), &args.oracle)?;
    config.validate()?;

    let oracle = PipeOracle::new(config.oracle.clone());
    let records = parse_records(io::stdin().lock())?;
    let outcome = verify(&oracle, &records)?;
    println!("ok: {} paths verified", outcome.checked);
    Ok(())
}

/// Load config (defaults when no file is given) and apply the command-line
/// oracle argv on top.
fn resolve_config(path: Option<&std::path::Path>, oracle: &[String]) -> Result<ExplorerConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ExplorerConfig::default(),
    };
    config.oracle.command = oracle.to_vec();
    Ok(config)
}
