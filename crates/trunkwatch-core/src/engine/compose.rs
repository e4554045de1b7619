// Trunkwatch — Alert Composer
//
// Signal → platform-neutral `AlertPayload`. The severity tier only changes
// presentation (colour, title, mention scope); detection is unaffected.

use super::extract::parse_quantity;
use crate::atoms::constants::MISSING_ITEM_LABEL;
use crate::atoms::types::{
    Action, AlertField, AlertPayload, Location, MentionScope, SeverityTier, Signal, SpamSignal,
    TransferSignal, WindowEntry,
};
use crate::config::MonitorConfig;
use chrono::{DateTime, Utc};

const COLOR_SPAM_INITIAL: u32 = 0xF5_A6_23;
const COLOR_SPAM_RECURRENT: u32 = 0xE0_24_24;
const COLOR_TRANSFER: u32 = 0x9B_59_B6;

#[derive(Debug, Clone)]
pub struct AlertComposer {
    window_secs: u64,
}

impl AlertComposer {
    pub fn new(config: &MonitorConfig) -> Self {
        Self { window_secs: config.time_window_secs }
    }

    pub fn compose(&self, signal: &Signal, now: DateTime<Utc>) -> AlertPayload {
        match signal {
            Signal::Spam(s) => self.compose_spam(s, now),
            Signal::Transfer(t) => self.compose_transfer(t, now),
        }
    }

    fn compose_spam(&self, signal: &SpamSignal, now: DateTime<Utc>) -> AlertPayload {
        let tier = tier_for(signal.escalation);
        let (title, color, mention) = match tier {
            SeverityTier::Initial => (
                "🚨 ATIVIDADE SUSPEITA DETECTADA".to_string(),
                COLOR_SPAM_INITIAL,
                MentionScope::Here,
            ),
            SeverityTier::Recurrent => (
                format!("🚨🚨 ATIVIDADE SUSPEITA RECORRENTE (#{})", signal.escalation),
                COLOR_SPAM_RECURRENT,
                MentionScope::Everyone,
            ),
        };

        let mut fields = vec![
            field("👤 Jogador", &signal.actor_name, true),
            field("🆔 ID no Servidor", &signal.actor_numeric_id, true),
            field("🔑 License", &format!("`{}`", signal.key.actor_id), false),
            field("📦 Ação", &format!("{} no {}", signal.key.action, signal.key.location), true),
            field("📊 Contagem", &signal.count.to_string(), true),
            field("🔁 Reincidência", &format!("{}ª ocorrência", signal.escalation), true),
            field("📋 Logs detectados", &numbered_summaries(&signal.recent), false),
        ];
        if let Some(items) = item_breakdown(&signal.recent) {
            fields.push(field("💰 Itens", &items, false));
        }

        AlertPayload {
            title,
            description: format!(
                "⏱️ **{} logs em menos de {} segundos!**\n⚠️ Verifique este jogador imediatamente!",
                signal.count,
                self.window_secs
            ),
            tier,
            mention,
            color,
            fields,
            generated_at: now,
        }
    }

    fn compose_transfer(&self, signal: &TransferSignal, now: DateTime<Utc>) -> AlertPayload {
        let dep = &signal.deposit;
        let wd = &signal.withdrawal;
        let kind = Location::from_container_id(&signal.container_id);
        let elapsed = (wd.observed_at - dep.observed_at).num_seconds().max(0);

        AlertPayload {
            title: "🔄 TRANSFERÊNCIA SUSPEITA ENTRE JOGADORES".to_string(),
            description: format!(
                "Um item colocado por **{}** foi retirado por **{}** {}s depois.",
                dep.actor_name, wd.actor_name, elapsed
            ),
            tier: SeverityTier::Initial,
            mention: MentionScope::Here,
            color: COLOR_TRANSFER,
            fields: vec![
                field(
                    "📥 Depositou",
                    &party(
                        &dep.actor_name,
                        &dep.actor_numeric_id,
                        &dep.actor_id,
                        Action::Deposit.label(),
                        dep.item_label.as_deref().unwrap_or(MISSING_ITEM_LABEL),
                    ),
                    true,
                ),
                field(
                    "📤 Retirou",
                    &party(&wd.actor_name, &wd.actor_numeric_id, &wd.actor_id, wd.action.label(), wd.item_display()),
                    true,
                ),
                field("🚗 Container", &format!("`{}` ({})", signal.container_id, kind), false),
                field("⏱️ Intervalo", &format!("{}s (janela {}s)", elapsed, self.window_secs), true),
            ],
            generated_at: now,
        }
    }
}

/// 1 → Initial, anything higher → Recurrent.
pub fn tier_for(escalation: u32) -> SeverityTier {
    if escalation >= 2 {
        SeverityTier::Recurrent
    } else {
        SeverityTier::Initial
    }
}

fn field(name: &str, value: &str, inline: bool) -> AlertField {
    AlertField { name: name.to_string(), value: value.to_string(), inline }
}

fn party(name: &str, numeric_id: &str, license: &str, verb: &str, item: &str) -> String {
    format!("**{}** (ID {})\nlicense `{}`\n{} {}", name, numeric_id, license, verb, item)
}

fn numbered_summaries(entries: &[WindowEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("**{}.** {}", i + 1, e.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Distinct non-empty labels plus the sum of their quantities; only when
/// more than one distinct label shows up.
pub fn item_breakdown(entries: &[WindowEntry]) -> Option<String> {
    let mut distinct: Vec<&str> = Vec::new();
    for label in entries.iter().filter_map(|e| e.item_label.as_deref()) {
        let label = label.trim();
        if label.is_empty() || label == MISSING_ITEM_LABEL || distinct.contains(&label) {
            continue;
        }
        distinct.push(label);
    }
    if distinct.len() < 2 {
        return None;
    }

    let total: u64 = distinct.iter().filter_map(|l| parse_quantity(l)).sum();
    let mut lines: Vec<String> = distinct.iter().map(|l| format!("• {}", l)).collect();
    lines.push(format!("**Total:** {}", total));
    Some(lines.join("\n"))
}
