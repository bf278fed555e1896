// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform update agent binary.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use en_core::{AgentConfig, TlsSettings};

use update_agent::daemon;

#[derive(Parser)]
#[command(name = "update-agent", about = "Edge-node platform update agent")]
struct Cli {
    /// Path to the agent configuration file.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dev mode: disable transport security.
    #[arg(long, hide = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the component version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        println!("Platform Update Agent v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(config_path) = cli.config else {
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    let config = AgentConfig::load(&config_path)?;
    daemon::init_tracing(&config);

    let tls = TlsSettings { insecure: cli.insecure, ..Default::default() };
    daemon::run(config, tls).await?;
    Ok(())
}
