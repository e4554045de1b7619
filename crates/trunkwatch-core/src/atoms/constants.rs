// ── Trunkwatch Atoms: Constants ────────────────────────────────────────────
// Named constants for the detection engine and the log format it reads.

// ── Detection defaults ─────────────────────────────────────────────────────
pub const DEFAULT_TIME_WINDOW_SECS: u64 = 60;
pub const DEFAULT_LOG_COUNT_THRESHOLD: usize = 3;
/// Alert cooldown is this many time windows when not configured explicitly.
pub const COOLDOWN_WINDOW_MULTIPLIER: u64 = 5;
/// Single-line entry summaries are cut at this many characters.
pub const DEFAULT_SUMMARY_CHARS: usize = 50;

// ── Log text markers (matched lowercased) ──────────────────────────────────
pub const ACTOR_MARKER: &str = "o jogador";
pub const GLOVE_BOX_MARKER: &str = "porta-luvas";
pub const TRUNK_MARKER: &str = "porta-malas";
pub const PLACED_KEYWORDS: &[&str] = &["colocou", "guardou"];
pub const TOOK_KEYWORDS: &[&str] = &["retirou", "pegou"];

/// Emphasis markup the log bot wraps names and items in.
pub const MARKUP_CHARS: &[char] = &['*', '_', '~', '`'];

// ── Container id prefixes ──────────────────────────────────────────────────
// In-game inventory ids look like `glovebox<plate>` / `trunk<plate>`.
pub const GLOVE_BOX_ID_PREFIX: &str = "glovebox";
pub const TRUNK_ID_PREFIX: &str = "trunk";

/// Words that appear as `<word> x<n>` in the log's own boilerplate and are
/// never item names.
pub const NON_ITEM_WORDS: &[&str] = &[
    "jogador",
    "player",
    "veiculo",
    "veículo",
    "vehicle",
    "coordenadas",
    "coordinates",
    "license",
    "luvas",
    "malas",
    "porta",
    "glovebox",
    "trunk",
];

/// Placeholder shown wherever an item label is missing.
pub const MISSING_ITEM_LABEL: &str = "?";

/// License tokens are cut to this many characters in info-level logs.
pub const LOG_LICENSE_PREFIX_LEN: usize = 10;
