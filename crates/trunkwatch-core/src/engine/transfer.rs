// Trunkwatch — Transfer Correlator
//
// Per container, two states: Empty (no entry in `pending`) and Pending (one
// live deposit). A deposit always overwrites; a withdrawal by someone other
// than the depositor consumes the record and signals once per
// (container, depositor, withdrawer) inside the window. A withdrawal by the
// depositor leaves the record live.

use crate::atoms::types::{Action, ActivityFact, DepositRecord, TransferSignal};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;

/// (container_id, depositor_id, withdrawer_id)
type TransferKey = (String, String, String);

#[derive(Debug)]
pub struct TransferCorrelator {
    window: Duration,
    pending: HashMap<String, DepositRecord>,
    /// TransferCooldown: triples already alerted, keyed to the alert time.
    alerted: HashMap<TransferKey, DateTime<Utc>>,
}

impl TransferCorrelator {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: HashMap::new(), alerted: HashMap::new() }
    }

    /// Stale deposits revert to Empty without signalling; alerted triples expire.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.pending.retain(|_, rec| now - rec.observed_at < window);
        self.alerted.retain(|_, at| now - *at < window);
    }

    pub fn observe(&mut self, fact: &ActivityFact) -> Option<TransferSignal> {
        let container_id = fact.container_id.as_ref()?;

        match fact.action {
            Action::Deposit => {
                if let Some(prev) = self.pending.insert(container_id.clone(), DepositRecord::from_fact(fact)) {
                    debug!(
                        "[transfer] Deposit by {} on {} supersedes unconsumed deposit by {}",
                        fact.actor_name, container_id, prev.actor_name
                    );
                }
                None
            }
            Action::Withdraw => {
                let deposit = self.pending.get(container_id)?;
                if deposit.actor_id == fact.actor_id {
                    debug!("[transfer] {} retrieved own deposit from {}", fact.actor_name, container_id);
                    return None;
                }

                let key: TransferKey =
                    (container_id.clone(), deposit.actor_id.clone(), fact.actor_id.clone());
                if self.alerted.contains_key(&key) {
                    debug!("[transfer] Pair already alerted for {}", container_id);
                    return None;
                }

                let deposit = self.pending.remove(container_id)?;
                self.alerted.insert(key, fact.observed_at);
                info!(
                    "[transfer] {} → {} via {} ({} / {})",
                    deposit.actor_name,
                    fact.actor_name,
                    container_id,
                    deposit.item_label.as_deref().unwrap_or("?"),
                    fact.item_display()
                );
                Some(TransferSignal {
                    container_id: container_id.clone(),
                    deposit,
                    withdrawal: fact.clone(),
                })
            }
        }
    }

    /// Containers currently holding a live deposit.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn cooldown_len(&self) -> usize {
        self.alerted.len()
    }

    pub fn pending_for(&self, container_id: &str) -> Option<&DepositRecord> {
        self.pending.get(container_id)
    }
}
