//! MiniPack CLI - Mini-program subpackage optimization
//!
//! A command-line interface for relocating shared components of a built
//! mini-program bundle into the subpackages that actually use them.
//!
//! # Usage
//!
//! ```bash
//! # Optimize a built bundle in place
//! minipack optimize dist/build/mp-weixin
//!
//! # Preview placement decisions without touching the tree
//! minipack analyze dist/build/mp-weixin
//!
//! # Machine-readable analysis
//! minipack analyze dist/build/mp-weixin --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

/// MiniPack - Mini-program subpackage optimizer
#[derive(Parser, Debug)]
#[command(name = "minipack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "MINIPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimize a built bundle in place
    Optimize(commands::optimize::OptimizeArgs),

    /// Compute and print placement decisions without mutating the bundle
    Analyze(commands::analyze::AnalyzeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is initialized per command, after the configuration files
    // are merged, so the file-based verbosity settings take effect too.
    match cli.command {
        Commands::Optimize(args) => commands::optimize::execute(args, cli.global),
        Commands::Analyze(args) => commands::analyze::execute(args, cli.global),
    }
}
