// Trunkwatch — Fact Extractor
//
// Turns one raw log message into an `ActivityFact`, or decides the message is
// irrelevant. Pure string/pattern matching, no state.
//
// Expected shape (markup varies):
//   O jogador **JPZIN** (license:1b0779c0…, 275) colocou **dinheiro x200**
//   no porta-malas do veículo trunkABC123
//
// Order of evaluation:
//   1. relevance filter (actor marker + a location marker), cheapest first
//   2. actor segment        — required
//   3. action keyword       — required, whole word, after the actor segment
//   4. location             — glove box wins ties
//   5. item label           — optional, after the actor segment
//   6. container id         — optional, ordered rule list
//
// Everything runs on markup-stripped text.

use crate::atoms::constants::{
    ACTOR_MARKER, GLOVE_BOX_MARKER, MARKUP_CHARS, NON_ITEM_WORDS, PLACED_KEYWORDS, TOOK_KEYWORDS,
    TRUNK_MARKER,
};
use crate::atoms::types::{Action, ActivityFact, Location};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

// ── Patterns ───────────────────────────────────────────────────────────────

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("[extract] Failed to compile pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Name capture is lazy so it stops at the credential delimiter even when the
/// name has spaces.
static ACTOR_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"(?i)o jogador\s+(.+?)\s*\(\s*license:\s*([0-9a-f]+)\s*,\s*(\d+)\s*\)")
});

static ITEM_RE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(\w+) x(\d+)\b"));

static PLACED_RE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(&keyword_pattern(PLACED_KEYWORDS)));
static TOOK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(&keyword_pattern(TOOK_KEYWORDS)));

/// Case-insensitive whole-word alternation.
fn keyword_pattern(words: &[&str]) -> String {
    format!(r"(?i)\b(?:{})\b", words.join("|"))
}

/// One container-id rule: a pattern whose first group is the id.
struct ContainerRule {
    name: &'static str,
    regex: Option<Regex>,
}

/// Tried top to bottom; the first rule that captures wins.
static CONTAINER_RULES: LazyLock<Vec<ContainerRule>> = LazyLock::new(|| {
    [
        ("vehicle phrase", r"(?i)veículo\s+((?:glovebox|trunk)[a-z0-9]+)"),
        ("vehicle phrase (no diacritic)", r"(?i)veiculo\s+((?:glovebox|trunk)[a-z0-9]+)"),
        ("bare glove box id", r"(?i)\b(glovebox[a-z0-9]+)"),
        ("bare trunk id", r"(?i)\b(trunk[a-z0-9]+)"),
    ]
    .into_iter()
    .map(|(name, pattern)| ContainerRule { name, regex: compile(pattern) })
    .collect()
});

// ── Helpers ────────────────────────────────────────────────────────────────

/// Remove emphasis markup (`*`, `_`, `~`, `` ` ``).
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Relevance filter: actor marker plus one of the two location markers.
pub fn is_relevant(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains(ACTOR_MARKER) && (lower.contains(GLOVE_BOX_MARKER) || lower.contains(TRUNK_MARKER))
}

struct ActorSegment {
    name: String,
    license: String,
    numeric_id: String,
    /// Byte offset just past the closing parenthesis.
    end: usize,
}

fn parse_actor(clean: &str) -> Option<ActorSegment> {
    let caps = ACTOR_RE.as_ref()?.captures(clean)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    Some(ActorSegment {
        name: name.to_string(),
        license: caps.get(2)?.as_str().to_string(),
        numeric_id: caps.get(3)?.as_str().to_string(),
        end: caps.get(0)?.end(),
    })
}

/// Whole-word keyword match; "placed" is checked before "took".
pub fn parse_action(clean: &str) -> Option<Action> {
    let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(clean));
    if matches(&PLACED_RE) {
        Some(Action::Deposit)
    } else if matches(&TOOK_RE) {
        Some(Action::Withdraw)
    } else {
        None
    }
}

/// Glove box is checked first when both markers appear.
pub fn parse_location(clean: &str) -> Location {
    let lower = clean.to_lowercase();
    if lower.contains(GLOVE_BOX_MARKER) {
        Location::GloveBox
    } else if lower.contains(TRUNK_MARKER) {
        Location::Trunk
    } else {
        Location::Unknown
    }
}

/// First `<word> x<n>` whose word isn't log boilerplate.
pub fn parse_item_label(clean: &str) -> Option<String> {
    let re = ITEM_RE.as_ref()?;
    re.captures_iter(clean).find_map(|caps| {
        let word = caps.get(1)?.as_str();
        let qty = caps.get(2)?.as_str();
        if NON_ITEM_WORDS.contains(&word.to_lowercase().as_str()) {
            return None;
        }
        Some(format!("{} x{}", word, qty))
    })
}

pub fn parse_container_id(clean: &str) -> Option<String> {
    CONTAINER_RULES.iter().find_map(|rule| {
        let caps = rule.regex.as_ref()?.captures(clean)?;
        let id = caps.get(1)?.as_str().to_string();
        debug!("[extract] Container id '{}' via {}", id, rule.name);
        Some(id)
    })
}

/// Quantity of an `item xN` label.
pub fn parse_quantity(label: &str) -> Option<u64> {
    let (_, qty) = label.rsplit_once(" x")?;
    qty.trim().parse().ok()
}

// ── Entry point ────────────────────────────────────────────────────────────

/// Extract a fact from a log message. `None` means irrelevant or missing a
/// required capture (actor or action); missing item/container never fails.
pub fn extract(text: &str, observed_at: DateTime<Utc>) -> Option<ActivityFact> {
    let clean = strip_markup(text);
    if !is_relevant(&clean) {
        debug!("[extract] Not a glove box/trunk log, skipping");
        return None;
    }

    let Some(actor) = parse_actor(&clean) else {
        debug!("[extract] No actor segment found");
        return None;
    };
    // the name may itself contain a keyword or an `xN` token
    let rest = &clean[actor.end..];
    let Some(action) = parse_action(rest) else {
        debug!("[extract] No action keyword for actor {}", actor.name);
        return None;
    };

    Some(ActivityFact {
        actor_name: actor.name,
        actor_id: actor.license,
        actor_numeric_id: actor.numeric_id,
        action,
        location: parse_location(&clean),
        container_id: parse_container_id(&clean),
        item_label: parse_item_label(rest),
        raw_text: text.to_string(),
        observed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPOSIT: &str = "O jogador **JPZIN** (license:1b0779c03eb4dd2f7ae1e2e74522aaa49069bf37, 275) \
        colocou **dinheiro x200** no porta-malas do veículo trunkABC123";

    #[test]
    fn full_deposit_line() {
        let now = Utc::now();
        let f = extract(DEPOSIT, now).expect("fact");
        assert_eq!(f.actor_name, "JPZIN");
        assert_eq!(f.actor_id, "1b0779c03eb4dd2f7ae1e2e74522aaa49069bf37");
        assert_eq!(f.actor_numeric_id, "275");
        assert_eq!(f.action, Action::Deposit);
        assert_eq!(f.location, Location::Trunk);
        assert_eq!(f.item_label.as_deref(), Some("dinheiro x200"));
        assert_eq!(f.container_id.as_deref(), Some("trunkABC123"));
        assert_eq!(f.raw_text, DEPOSIT);
        assert_eq!(f.observed_at, now);
    }

    #[test]
    fn withdraw_from_glove_box() {
        let text = "O jogador lucaspirespsn (license:4125f3186251695bc985402d3a0409fc3781aa48, 40) \
            retirou municao x30 do porta-luvas do veiculo gloveboxQWE77";
        let f = extract(text, Utc::now()).unwrap();
        assert_eq!(f.action, Action::Withdraw);
        assert_eq!(f.location, Location::GloveBox);
        assert_eq!(f.container_id.as_deref(), Some("gloveboxQWE77"));
        assert_eq!(f.item_label.as_deref(), Some("municao x30"));
    }

    #[test]
    fn name_with_spaces_and_markup() {
        let text = "O jogador **Joao _da_ Silva** (license:abc123, 9) pegou algo no porta-malas";
        let f = extract(text, Utc::now()).unwrap();
        assert_eq!(f.actor_name, "Joao da Silva");
        assert_eq!(f.actor_id, "abc123");
        assert_eq!(f.actor_numeric_id, "9");
    }

    #[test]
    fn irrelevant_text_is_rejected() {
        let now = Utc::now();
        assert!(extract("bom dia a todos", now).is_none());
        // actor marker but no location marker
        assert!(extract("O jogador X (license:ab, 1) colocou algo na casa", now).is_none());
        // location marker but no actor marker
        assert!(extract("Algo foi colocado no porta-malas", now).is_none());
    }

    #[test]
    fn missing_action_is_rejected() {
        let text = "O jogador X (license:ab12, 1) abriu o porta-malas do veículo trunkA1";
        assert!(extract(text, Utc::now()).is_none());
    }

    #[test]
    fn missing_actor_segment_is_rejected() {
        let text = "O jogador X colocou dinheiro x5 no porta-malas";
        assert!(extract(text, Utc::now()).is_none());
    }

    #[test]
    fn optional_fields_absent() {
        let text = "O jogador X (license:ab12, 1) colocou algo no porta-malas";
        let f = extract(text, Utc::now()).unwrap();
        assert!(f.item_label.is_none());
        assert!(f.container_id.is_none());
        assert_eq!(f.item_display(), "?");
    }

    #[test]
    fn glove_box_wins_when_both_markers_present() {
        let text = "O jogador X (license:ab12, 1) colocou arma x1 no porta-luvas (antes porta-malas)";
        assert_eq!(extract(text, Utc::now()).unwrap().location, Location::GloveBox);
    }

    #[test]
    fn boilerplate_words_are_not_items() {
        assert_eq!(parse_item_label("license x2 then Vehicle x3 then pao x4").as_deref(), Some("pao x4"));
        assert_eq!(parse_item_label("jogador x1 coordenadas x2"), None);
    }

    #[test]
    fn vehicle_phrase_beats_bare_id() {
        let clean = "moved from trunkOLD1 into veículo gloveboxNEW2";
        assert_eq!(parse_container_id(clean).as_deref(), Some("gloveboxNEW2"));
        let clean = "moved from trunkOLD1 into veiculo trunkNEW2";
        assert_eq!(parse_container_id(clean).as_deref(), Some("trunkNEW2"));
    }

    #[test]
    fn bare_glove_box_id_beats_bare_trunk_id() {
        assert_eq!(parse_container_id("trunkAA1 gloveboxBB2").as_deref(), Some("gloveboxBB2"));
        assert_eq!(parse_container_id("nothing here"), None);
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("dinheiro x200"), Some(200));
        assert_eq!(parse_quantity("?"), None);
        assert_eq!(parse_quantity("pao xabc"), None);
    }

    #[test]
    fn place_keyword_checked_before_took() {
        assert_eq!(parse_action("colocou e depois retirou"), Some(Action::Deposit));
        assert_eq!(parse_action("PEGOU"), Some(Action::Withdraw));
        assert_eq!(parse_action("olhou"), None);
    }

    #[test]
    fn keywords_must_be_whole_words() {
        assert_eq!(parse_action("recolocou pao"), None);
        assert_eq!(parse_action("Guardouzinho"), None);
        assert_eq!(parse_action("**retirou**"), Some(Action::Withdraw));
    }

    #[test]
    fn keyword_inside_actor_name_is_ignored() {
        let now = Utc::now();
        let text = "O jogador Guardouzinho (license:ab12, 1) retirou pao x1 no porta-malas";
        let f = extract(text, now).unwrap();
        assert_eq!(f.actor_name, "Guardouzinho");
        assert_eq!(f.action, Action::Withdraw);

        let text = "O jogador Colocou Silva (license:ab12, 1) pegou pao x1 no porta-malas do veículo trunkA1";
        assert_eq!(extract(text, now).unwrap().action, Action::Withdraw);

        // a name that is only a keyword does not stand in for a missing action
        let text = "O jogador Guardou (license:ab12, 1) abriu o porta-malas";
        assert!(extract(text, now).is_none());
    }

    #[test]
    fn item_token_inside_actor_name_is_ignored() {
        let text = "O jogador Rei x1 (license:ab12, 1) colocou pao x3 no porta-malas";
        let f = extract(text, Utc::now()).unwrap();
        assert_eq!(f.actor_name, "Rei x1");
        assert_eq!(f.item_label.as_deref(), Some("pao x3"));
    }

    #[test]
    fn markup_inside_markers_is_stripped_before_filtering() {
        let text = "*O jogador* X (license:ab12, 1) colocou pao x1 no porta-*malas*";
        let f = extract(text, Utc::now()).expect("fact");
        assert_eq!(f.location, Location::Trunk);
    }
}
