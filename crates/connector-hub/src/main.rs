mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use connector_core::{config, logging};

use commands::{Commands, Overrides};

/// Configure and run the cloud connector send-data action
#[derive(Parser)]
#[command(
    name = "connector",
    about = "Configure and run the cloud connector send-data action",
    long_about = None
)]
struct Cli {
    /// Show debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/connector/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let mut config = config::load_config(&path)?;
    cli.overrides.apply(&mut config);

    commands::execute(cli.command, &config, &path).await
}
