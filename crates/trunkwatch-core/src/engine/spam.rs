// Trunkwatch — Spam Detector
//
// Counts facts per aggregation key inside the window. Every fact that leaves
// a bucket at or above the threshold fires again: history is never cleared
// after an alert, so sustained abuse keeps alerting and the escalation count
// climbs until the cooldown lapses with no new alert.

use super::window::{summarize, WindowStore};
use crate::atoms::constants::LOG_LICENSE_PREFIX_LEN;
use crate::atoms::types::{ActivityFact, AggregationKey, SpamSignal, WindowEntry};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AlertCooldown {
    last_alert_at: DateTime<Utc>,
    escalation_count: u32,
}

#[derive(Debug)]
pub struct SpamDetector {
    threshold: usize,
    cooldown: Duration,
    summary_chars: usize,
    window: WindowStore,
    cooldowns: HashMap<AggregationKey, AlertCooldown>,
}

impl SpamDetector {
    pub fn new(window: Duration, threshold: usize, cooldown: Duration, summary_chars: usize) -> Self {
        Self {
            threshold,
            cooldown,
            summary_chars,
            window: WindowStore::new(window),
            cooldowns: HashMap::new(),
        }
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.window.prune(now);
        let cooldown = self.cooldown;
        self.cooldowns.retain(|_, c| now - c.last_alert_at < cooldown);
    }

    pub fn observe(&mut self, fact: &ActivityFact) -> Option<SpamSignal> {
        let key = fact.aggregation_key();
        let now = fact.observed_at;

        self.window.append(
            key.clone(),
            WindowEntry {
                observed_at: now,
                summary: summarize(&fact.raw_text, self.summary_chars),
                item_label: fact.item_label.clone(),
            },
        );

        let count = self.window.count(&key);
        let short_license: String = key.actor_id.chars().take(LOG_LICENSE_PREFIX_LEN).collect();
        if count < self.threshold {
            debug!(
                "[spam] {} ({}…) {}/{} for {} {}",
                fact.actor_name, short_license, count, self.threshold, key.action, key.location
            );
            return None;
        }

        let previous = match self.cooldowns.get(&key) {
            Some(c) if now - c.last_alert_at < self.cooldown => c.escalation_count,
            _ => 0,
        };
        let escalation = previous + 1;
        self.cooldowns.insert(
            key.clone(),
            AlertCooldown { last_alert_at: now, escalation_count: escalation },
        );

        info!(
            "[spam] Threshold hit for {} ({}…): {} × {} {} (escalation {})",
            fact.actor_name, short_license, count, key.action, key.location, escalation
        );

        Some(SpamSignal {
            recent: self.window.recent(&key, self.threshold),
            key,
            actor_name: fact.actor_name.clone(),
            actor_numeric_id: fact.actor_numeric_id.clone(),
            count,
            escalation,
        })
    }

    pub fn count(&self, key: &AggregationKey) -> usize {
        self.window.count(key)
    }

    /// Live window buckets.
    pub fn bucket_len(&self) -> usize {
        self.window.len()
    }

    /// Keys still remembered for escalation.
    pub fn cooldown_len(&self) -> usize {
        self.cooldowns.len()
    }
}
