#[cfg(feature = "cli")]
pub mod cli;
pub mod topology_config;

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    Summary,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "deploy-topology")]
#[command(about = "Resolve deploy environments, uptime schedules and shared database servers")]
pub struct CliConfig {
    /// Path to the topology TOML file
    #[arg(short, long, default_value = "topology.toml")]
    pub config: String,

    /// Override the deployment region from the config file
    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, value_enum, default_value = "summary")]
    pub format: OutputFormat,

    /// Write the resolved plan as JSON to this path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Validate and resolve only, print nothing but the outcome
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}
