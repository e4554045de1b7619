// ── Trunkwatch Atoms: Pure Data Types ──────────────────────────────────────
// Plain struct/enum definitions shared by every detection stage.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{GLOVE_BOX_ID_PREFIX, MISSING_ITEM_LABEL, TRUNK_ID_PREFIX};

// ── Fact vocabulary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Deposit,
    Withdraw,
}

impl Action {
    /// Verb used in alert bodies.
    pub fn label(self) -> &'static str {
        match self {
            Action::Deposit => "colocou",
            Action::Withdraw => "retirou",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    GloveBox,
    Trunk,
    Unknown,
}

impl Location {
    /// Kind of a container derived from its id prefix (`glovebox…` / `trunk…`).
    pub fn from_container_id(container_id: &str) -> Self {
        let lower = container_id.to_lowercase();
        if lower.starts_with(GLOVE_BOX_ID_PREFIX) {
            Location::GloveBox
        } else if lower.starts_with(TRUNK_ID_PREFIX) {
            Location::Trunk
        } else {
            Location::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Location::GloveBox => "porta-luvas",
            Location::Trunk => "porta-malas",
            Location::Unknown => "desconhecido",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One structured fact extracted from a single log message.
/// An `ActivityFact` always has a known action; lines without one are never
/// materialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFact {
    pub actor_name: String,
    /// Stable identity token (the hex license credential).
    pub actor_id: String,
    pub actor_numeric_id: String,
    pub action: Action,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// Free-form `item xN` token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,
    pub raw_text: String,
    pub observed_at: DateTime<Utc>,
}

impl ActivityFact {
    pub fn aggregation_key(&self) -> AggregationKey {
        AggregationKey {
            actor_id: self.actor_id.clone(),
            action: self.action,
            location: self.location,
        }
    }

    /// Item label for display; missing labels render as `?`.
    pub fn item_display(&self) -> &str {
        self.item_label.as_deref().unwrap_or(MISSING_ITEM_LABEL)
    }
}

/// "The same kind of repeated action": actor + action + location.
/// Item and container are deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationKey {
    pub actor_id: String,
    pub action: Action,
    pub location: Location,
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.actor_id, self.action, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub observed_at: DateTime<Utc>,
    pub summary: String,
    pub item_label: Option<String>,
}

/// The live, unconsumed deposit for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub observed_at: DateTime<Utc>,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_numeric_id: String,
    pub item_label: Option<String>,
    pub location: Location,
}

impl DepositRecord {
    pub fn from_fact(fact: &ActivityFact) -> Self {
        DepositRecord {
            observed_at: fact.observed_at,
            actor_id: fact.actor_id.clone(),
            actor_name: fact.actor_name.clone(),
            actor_numeric_id: fact.actor_numeric_id.clone(),
            item_label: fact.item_label.clone(),
            location: fact.location,
        }
    }
}

// ── Signals ────────────────────────────────────────────────────────────────

/// Repeated same-kind actions crossed the threshold inside the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamSignal {
    pub key: AggregationKey,
    pub actor_name: String,
    pub actor_numeric_id: String,
    /// Bucket size when the signal fired.
    pub count: usize,
    /// Most recent entries, oldest first, at most `log_count_threshold`.
    pub recent: Vec<WindowEntry>,
    /// 1 for the first alert of a burst, incremented on every re-alert.
    pub escalation: u32,
}

/// A deposit by one actor was retrieved by another from the same container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSignal {
    pub container_id: String,
    pub deposit: DepositRecord,
    pub withdrawal: ActivityFact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Signal {
    Spam(SpamSignal),
    Transfer(TransferSignal),
}

// ── Collaborator payloads ──────────────────────────────────────────────────

/// One message delivered by the inbound event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    /// First alert for a key.
    Initial,
    /// Second and later alerts inside the cooldown.
    Recurrent,
}

/// Who gets pinged when the alert is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionScope {
    Here,
    Everyone,
}

impl MentionScope {
    pub fn as_mention(self) -> &'static str {
        match self {
            MentionScope::Here => "@here",
            MentionScope::Everyone => "@everyone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Platform-neutral alert, rendered by the outbound sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub title: String,
    pub description: String,
    pub tier: SeverityTier,
    pub mention: MentionScope,
    /// 0xRRGGBB
    pub color: u32,
    pub fields: Vec<AlertField>,
    pub generated_at: DateTime<Utc>,
}
