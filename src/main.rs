mod api;
mod commands;
mod config;
mod domain;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "openclaw-dashboard",
    version,
    about = "Monitoring dashboard for an OpenClaw gateway and its host"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard server (JSON API + static front-end)
    Serve {
        /// Path to config file (default: ./config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Listen address (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,

        /// Log level (overrides config)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Validate the config file and every configured probe target
    CheckConfig {
        /// Path to config file (default: ./config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            host,
            log_level,
        } => commands::serve::run(config, port, host, log_level),
        Commands::CheckConfig { config } => commands::check_config::run(config),
    }
}
