// Replay a recorded event log through a fresh engine.

use anyhow::Context;
use async_trait::async_trait;
use log::warn;
use std::path::Path;
use trunkwatch_core::{AlertPayload, AlertSink, Engine, EngineResult, EngineStats, InboundEvent, MonitorConfig};

/// Parse JSON lines; blank lines are skipped, bad lines logged and skipped.
pub fn parse_events(content: &str) -> Vec<InboundEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<InboundEvent>(line) {
            Ok(ev) => Some(ev),
            Err(e) => {
                warn!("[replay] Line {} skipped: {}", i + 1, e);
                None
            }
        })
        .collect()
}

/// Prints alerts to stdout.
struct StdoutSink {
    json: bool,
}

#[async_trait]
impl AlertSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&self, channel_id: &str, alert: &AlertPayload) -> EngineResult<()> {
        if self.json {
            println!("{}", serde_json::to_string(alert)?);
        } else {
            println!("{}", render_text(channel_id, alert));
        }
        Ok(())
    }
}

pub fn render_text(channel_id: &str, alert: &AlertPayload) -> String {
    let mut out = format!(
        "── [{}] {} → #{} ({:?})\n{}\n",
        alert.generated_at.format("%H:%M:%S"),
        alert.title,
        channel_id,
        alert.tier,
        alert.description
    );
    for f in &alert.fields {
        out.push_str(&format!("  {}: {}\n", f.name, f.value.replace('\n', "\n    ")));
    }
    out
}

/// Replay `file` and return the engine's final statistics.
pub async fn run(
    mut config: MonitorConfig,
    file: &Path,
    json: bool,
    any_source: bool,
) -> anyhow::Result<EngineStats> {
    config.validate()?;
    let content = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let events = parse_events(&content);

    let sink = StdoutSink { json };
    if config.alert_channel_id.is_empty() {
        config.alert_channel_id = "replay".into();
    }
    let mut engine = Engine::new(config.clone());

    for mut event in events {
        if any_source {
            event.channel_id = config.source_channel_id.clone();
            event.author_id = config.source_author_id.clone();
        }
        engine.handle(&event, &sink).await;
    }

    let stats = engine.stats();
    if json {
        eprintln!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "{} events ({} filtered), {} facts, {} spam / {} transfer alerts",
            stats.events_seen, stats.events_filtered, stats.facts_accepted, stats.spam_signals, stats.transfer_signals
        );
    }
    Ok(stats)
}
