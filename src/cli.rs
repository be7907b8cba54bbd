//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Swarm request workflow service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Port for the HTTP surface (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP surface and the reminder scheduler (default)
    Serve,

    /// Print aggregate request counts as JSON
    Stats,

    /// Run one reminder sweep and exit
    Sweep,
}
