// Trunkwatch — Engine (orchestrator)
//
// One fact at a time, fully processed before the next is accepted:
//   filter → extract → prune → correlate → detect → compose → deliver
// All state changes finish before the first await on the sink, so a slow or
// failing delivery can never leave the maps half-updated.

use super::compose::AlertComposer;
use super::extract::extract;
use super::spam::SpamDetector;
use super::transfer::TransferCorrelator;
use crate::atoms::constants::LOG_LICENSE_PREFIX_LEN;
use crate::atoms::types::{ActivityFact, AlertPayload, InboundEvent, Signal};
use crate::channels::{AlertSink, EventSource};
use crate::config::MonitorConfig;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub events_seen: u64,
    /// Wrong channel or author.
    pub events_filtered: u64,
    pub facts_accepted: u64,
    pub spam_signals: u64,
    pub transfer_signals: u64,
    pub alerts_delivered: u64,
    pub delivery_failures: u64,
    pub live_buckets: usize,
    pub live_cooldowns: usize,
    pub pending_deposits: usize,
    pub transfer_cooldowns: usize,
}

pub struct Engine {
    config: MonitorConfig,
    spam: SpamDetector,
    transfers: TransferCorrelator,
    composer: AlertComposer,
    stats: EngineStats,
}

impl Engine {
    pub fn new(config: MonitorConfig) -> Self {
        let window = config.time_window();
        Engine {
            spam: SpamDetector::new(window, config.log_count_threshold, config.cooldown(), config.summary_chars),
            transfers: TransferCorrelator::new(window),
            composer: AlertComposer::new(&config),
            stats: EngineStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Exact match on the configured source channel and author.
    pub fn accepts(&self, event: &InboundEvent) -> bool {
        event.channel_id == self.config.source_channel_id && event.author_id == self.config.source_author_id
    }

    /// Run one fact through every detector. Prunes first, then feeds the
    /// transfer correlator and the spam detector in that order.
    pub fn observe(&mut self, fact: &ActivityFact) -> Vec<Signal> {
        let now = fact.observed_at;
        self.spam.prune(now);
        self.transfers.prune(now);

        self.stats.facts_accepted += 1;
        let short_license: String = fact.actor_id.chars().take(LOG_LICENSE_PREFIX_LEN).collect();
        info!(
            "[engine] Log detected — {} {} no {} | license {}… | ID {}",
            fact.actor_name, fact.action, fact.location, short_license, fact.actor_numeric_id
        );

        let mut signals = Vec::new();
        if let Some(t) = self.transfers.observe(fact) {
            self.stats.transfer_signals += 1;
            signals.push(Signal::Transfer(t));
        }
        if let Some(s) = self.spam.observe(fact) {
            self.stats.spam_signals += 1;
            signals.push(Signal::Spam(s));
        }
        signals
    }

    /// Filter, extract and detect. Returns the alerts to deliver; nothing
    /// here can fail on a malformed message.
    pub fn ingest(&mut self, event: &InboundEvent) -> Vec<AlertPayload> {
        self.stats.events_seen += 1;
        if !self.accepts(event) {
            self.stats.events_filtered += 1;
            debug!("[engine] Ignoring message from {} in {}", event.author_id, event.channel_id);
            return Vec::new();
        }

        let Some(fact) = extract(&event.content, event.received_at) else {
            return Vec::new();
        };

        self.observe(&fact)
            .iter()
            .map(|signal| self.composer.compose(signal, event.received_at))
            .collect()
    }

    /// Process one event and hand any alerts to the sink. Delivery failures
    /// are logged and counted; engine state is already settled by then.
    pub async fn handle(&mut self, event: &InboundEvent, sink: &dyn AlertSink) -> usize {
        let alerts = self.ingest(event);
        let mut delivered = 0;
        for alert in &alerts {
            match sink.deliver(&self.config.alert_channel_id, alert).await {
                Ok(()) => {
                    delivered += 1;
                    self.stats.alerts_delivered += 1;
                    info!("[engine] Alert '{}' sent via {} to {}", alert.title, sink.name(), self.config.alert_channel_id);
                }
                Err(e) => {
                    self.stats.delivery_failures += 1;
                    warn!("[engine] Failed to send alert via {}: {}", sink.name(), e);
                }
            }
        }
        delivered
    }

    /// Drain a source until it ends.
    pub async fn run<S>(&mut self, source: &mut S, sink: &dyn AlertSink)
    where
        S: EventSource + ?Sized,
    {
        while let Some(event) = source.next_event().await {
            self.handle(&event, sink).await;
        }
        info!("[engine] Event source closed after {} events", self.stats.events_seen);
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            live_buckets: self.spam.bucket_len(),
            live_cooldowns: self.spam.cooldown_len(),
            pending_deposits: self.transfers.pending_len(),
            transfer_cooldowns: self.transfers.cooldown_len(),
            ..self.stats.clone()
        }
    }
}
