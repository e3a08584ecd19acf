// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mining coordinator for the crypto mining simulator
#[derive(Parser, Debug)]
#[command(name = "cryptosim-miner")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (serve the control surface or write a config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Run the coordinator and its HTTP control surface
    Serve(ServeOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for running the coordinator
#[derive(Parser, Debug, Default)]
pub struct ServeOptions {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listening port (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Keep stats in process memory instead of Redis
    #[arg(long)]
    pub memory_store: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "coordinator.toml")]
    pub output: PathBuf,
}
