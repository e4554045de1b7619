// Trunkwatch — live monitor binary

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use trunkwatch_app::discord::{spawn_gateway, DiscordSink};
use trunkwatch_app::monitor::{run_monitor, EVENT_QUEUE_CAPACITY};
use trunkwatch_core::MonitorConfig;

#[derive(Parser)]
#[command(name = "trunkwatch")]
#[command(about = "Alert on glove box / trunk abuse in a Discord log channel")]
struct Args {
    /// TOML config file (defaults to $CONFIG_DIR/trunkwatch/config.toml)
    #[arg(short, long, env = "TRUNKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Discord bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = MonitorConfig::load(args.config.as_deref()).context("loading config")?;
    config.validate_for_bridge().context("invalid config")?;

    let stop = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let gateway = spawn_gateway(args.token.clone(), tx, stop.clone());
    let sink = DiscordSink::new(args.token);

    let ctrl_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[monitor] Ctrl-C received, shutting down");
            ctrl_stop.store(true, Ordering::Relaxed);
        }
    });

    tokio::select! {
        res = run_monitor(config, &mut rx, &sink) => {
            res.context("monitor stopped")?;
        }
        _ = wait_for(stop.clone()) => {
            gateway.abort();
        }
    }

    if !stop.load(Ordering::Relaxed) {
        warn!("[monitor] Gateway ended without a stop request");
    }
    Ok(())
}

async fn wait_for(flag: Arc<AtomicBool>) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }
}
