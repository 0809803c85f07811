//! CLI interface for synthbot
//!
//! Provides subcommands for:
//! - `run`: Start the trading loop
//! - `status`: Show current state
//! - `config`: Show configuration

mod run;

pub use run::{RunArgs, StrategyChoice};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "synthbot")]
#[command(about = "Automated trading engine for short-duration binary contracts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading loop
    Run(RunArgs),
    /// Show current state
    Status,
    /// Show configuration
    Config,
}
