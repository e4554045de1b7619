// Trunkwatch CLI — offline tools around the detection engine.
//
//   check   run the fact extractor on one log line
//   replay  feed a JSON-lines event log through a fresh engine
//   config  print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod check;
mod replay;

#[derive(Parser)]
#[command(name = "trunkwatch-cli")]
#[command(about = "Offline tools for the Trunkwatch detection engine")]
pub struct Cli {
    /// TOML config file (defaults to $CONFIG_DIR/trunkwatch/config.toml)
    #[arg(short, long, global = true, env = "TRUNKWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one log line and print the extracted fact as JSON
    Check {
        /// Log text; reads stdin when omitted
        text: Option<String>,
    },
    /// Replay a JSON-lines event log and print every alert
    Replay {
        /// File with one {"channel_id","author_id","content","received_at"} per line
        file: PathBuf,
        /// Print alerts as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Accept events from any channel/author
        #[arg(long)]
        any_source: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { text } => check::run(text),
        Commands::Replay { file, json, any_source } => {
            let config = trunkwatch_core::MonitorConfig::load(cli.config.as_deref())?;
            replay::run(config, &file, json, any_source).await?;
            Ok(())
        }
        Commands::Config => {
            let config = trunkwatch_core::MonitorConfig::load(cli.config.as_deref())?;
            config.validate()?;
            println!("{}", toml::to_string_pretty(&config)?);
            println!("# effective cooldown: {}s", config.cooldown().num_seconds());
            Ok(())
        }
    }
}
