// Trunkwatch — Monitor wiring
//
// Owns the Engine and runs it against a source and a sink until the source
// ends. The engine consumes one event at a time; the gateway only queues.

use log::info;
use trunkwatch_core::{AlertSink, Engine, EngineResult, EngineStats, EventSource, MonitorConfig};

/// Events buffered between the gateway and the engine.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Log the effective configuration once at startup.
pub fn log_banner(config: &MonitorConfig) {
    info!("[monitor] Watching channel {} for author {}", config.source_channel_id, config.source_author_id);
    info!("[monitor] Alerts go to channel {}", config.alert_channel_id);
    info!(
        "[monitor] Window {}s | threshold {} logs | cooldown {}s",
        config.time_window_secs,
        config.log_count_threshold,
        config.cooldown().num_seconds()
    );
}

/// Validate, build a fresh engine and drain `source` into `sink`.
pub async fn run_monitor<S>(config: MonitorConfig, source: &mut S, sink: &dyn AlertSink) -> EngineResult<EngineStats>
where
    S: EventSource + ?Sized,
{
    config.validate()?;
    log_banner(&config);
    let mut engine = Engine::new(config);
    engine.run(source, sink).await;
    let stats = engine.stats();
    info!(
        "[monitor] Done: {} events, {} facts, {} spam / {} transfer signals, {} delivered, {} failed",
        stats.events_seen,
        stats.facts_accepted,
        stats.spam_signals,
        stats.transfer_signals,
        stats.alerts_delivered,
        stats.delivery_failures
    );
    Ok(stats)
}
