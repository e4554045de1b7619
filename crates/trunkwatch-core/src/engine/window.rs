// Trunkwatch — Window Store
//
// Aggregation key → timestamped entries in arrival order. Expiry is lazy:
// `prune` runs at the top of every processing cycle and drops whole buckets
// once they empty, so memory tracks active keys only.

use crate::atoms::types::{AggregationKey, WindowEntry};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

/// One-line summary of a log message: its first line if it has several,
/// otherwise the first `max_chars` characters.
pub fn summarize(text: &str, max_chars: usize) -> String {
    match text.split_once('\n') {
        Some((first, _)) => first.trim_end().to_string(),
        None => text.chars().take(max_chars).collect(),
    }
}

#[derive(Debug)]
pub struct WindowStore {
    window: Duration,
    buckets: HashMap<AggregationKey, VecDeque<WindowEntry>>,
}

impl WindowStore {
    pub fn new(window: Duration) -> Self {
        Self { window, buckets: HashMap::new() }
    }

    /// Drop entries with `now - observed_at >= window` from every bucket.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.buckets.retain(|_, entries| {
            entries.retain(|e| now - e.observed_at < window);
            !entries.is_empty()
        });
    }

    pub fn append(&mut self, key: AggregationKey, entry: WindowEntry) {
        self.buckets.entry(key).or_default().push_back(entry);
    }

    pub fn count(&self, key: &AggregationKey) -> usize {
        self.buckets.get(key).map_or(0, VecDeque::len)
    }

    /// The most recent `n` entries for a key, oldest first.
    pub fn recent(&self, key: &AggregationKey, n: usize) -> Vec<WindowEntry> {
        match self.buckets.get(key) {
            Some(entries) => {
                let skip = entries.len().saturating_sub(n);
                entries.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Number of live buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
