//! CLI argument parsing for the dispatch-worker binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dispatch-worker", version, about = "Trucking dispatch backend worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
}
