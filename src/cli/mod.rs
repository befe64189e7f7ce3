//! CLI entry points

pub mod serve;

use clap::{Parser, Subcommand};

/// Model Hub - upload, validate and serve ML model bundles
#[derive(Parser)]
#[command(name = "model-hub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}
