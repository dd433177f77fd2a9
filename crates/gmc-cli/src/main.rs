use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use commands::{
    evaluate::{self, EvaluateArgs},
    filter::{self, FilterArgs},
    sets::{self, SetsArgs},
    version::{self, VersionArgs},
};
use gmc_sets::{load_config, CompositeConfig};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "gmc", about = "Composite ground-motion model CLI")]
struct Cli {
    /// Log engine decisions at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a configured set or composite for a scenario.
    Evaluate(EvaluateArgs),
    /// List configured and built-in sets with their weights.
    Sets(SetsArgs),
    /// Show which members of a set survive the period filter.
    Filter(FilterArgs),
    /// Print version information.
    Version(VersionArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Evaluate(args) => evaluate::run(&args),
        Command::Sets(args) => sets::run(&args),
        Command::Filter(args) => filter::run(&args),
        Command::Version(args) => version::run(&args),
    }
}

pub(crate) fn load_optional_config(path: Option<&Path>) -> Result<CompositeConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(CompositeConfig::default()),
    }
}

pub(crate) fn write_output(path: Option<&PathBuf>, text: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
