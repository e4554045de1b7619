// Trunkwatch — Monitor Configuration
//
// Resolution order: built-in defaults → TOML file → environment variables.
// The Discord bot token is never part of this struct; the bridge reads it
// straight from `DISCORD_BOT_TOKEN`.

use crate::atoms::constants::{
    COOLDOWN_WINDOW_MULTIPLIER, DEFAULT_LOG_COUNT_THRESHOLD, DEFAULT_SUMMARY_CHARS,
    DEFAULT_TIME_WINDOW_SECS,
};
use crate::atoms::error::{EngineError, EngineResult};
use chrono::Duration;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_TIME_WINDOW_SECS: &str = "TRUNKWATCH_TIME_WINDOW_SECS";
pub const ENV_THRESHOLD: &str = "TRUNKWATCH_THRESHOLD";
pub const ENV_COOLDOWN_SECS: &str = "TRUNKWATCH_COOLDOWN_SECS";
pub const ENV_SOURCE_CHANNEL_ID: &str = "TRUNKWATCH_SOURCE_CHANNEL_ID";
pub const ENV_SOURCE_AUTHOR_ID: &str = "TRUNKWATCH_SOURCE_AUTHOR_ID";
pub const ENV_ALERT_CHANNEL_ID: &str = "TRUNKWATCH_ALERT_CHANNEL_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sliding window for both detectors (`TIME_WINDOW`).
    pub time_window_secs: u64,
    /// Facts per aggregation key that trigger a spam alert.
    pub log_count_threshold: usize,
    /// Escalation memory per key; `None` means 5 × the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_secs: Option<u64>,
    /// Channel the log bot posts into.
    pub source_channel_id: String,
    /// User id of the log bot.
    pub source_author_id: String,
    /// Channel alerts are posted to.
    pub alert_channel_id: String,
    /// Length cut for single-line entry summaries.
    pub summary_chars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            time_window_secs: DEFAULT_TIME_WINDOW_SECS,
            log_count_threshold: DEFAULT_LOG_COUNT_THRESHOLD,
            cooldown_secs: None,
            source_channel_id: String::new(),
            source_author_id: String::new(),
            alert_channel_id: String::new(),
            summary_chars: DEFAULT_SUMMARY_CHARS,
        }
    }
}

impl MonitorConfig {
    /// Window as a `Duration`; saturates for values `validate` rejects.
    pub fn time_window(&self) -> Duration {
        seconds(self.time_window_secs).unwrap_or(Duration::MAX)
    }

    /// Explicit cooldown, else `COOLDOWN_WINDOW_MULTIPLIER` windows.
    pub fn cooldown(&self) -> Duration {
        self.cooldown_secs_checked().and_then(seconds).unwrap_or(Duration::MAX)
    }

    fn cooldown_secs_checked(&self) -> Option<u64> {
        match self.cooldown_secs {
            Some(secs) => Some(secs),
            None => self.time_window_secs.checked_mul(COOLDOWN_WINDOW_MULTIPLIER),
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        Ok(toml::from_str::<MonitorConfig>(content)?)
    }

    /// Load from an explicit file, or the default location if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => MonitorConfig::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        info!("[config] Loaded {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Overlay values from the environment. `lookup` is injectable so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> EngineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_TIME_WINDOW_SECS) {
            self.time_window_secs = parse_number(ENV_TIME_WINDOW_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_THRESHOLD) {
            self.log_count_threshold = parse_number(ENV_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_COOLDOWN_SECS) {
            self.cooldown_secs = Some(parse_number(ENV_COOLDOWN_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_SOURCE_CHANNEL_ID) {
            self.source_channel_id = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_SOURCE_AUTHOR_ID) {
            self.source_author_id = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_ALERT_CHANNEL_ID) {
            self.alert_channel_id = v.trim().to_string();
        }
        Ok(())
    }

    /// Reject settings the detectors can't run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.time_window_secs == 0 {
            return Err(EngineError::config("time_window_secs must be greater than 0"));
        }
        if seconds(self.time_window_secs).is_none() {
            return Err(EngineError::config(format!(
                "time_window_secs ({}) is out of range",
                self.time_window_secs
            )));
        }
        if self.log_count_threshold < 1 {
            return Err(EngineError::config("log_count_threshold must be at least 1"));
        }
        let cooldown_secs = match self.cooldown_secs_checked() {
            Some(secs) if seconds(secs).is_some() => secs,
            _ => return Err(EngineError::config("cooldown is out of range")),
        };
        if cooldown_secs < self.time_window_secs {
            return Err(EngineError::config(format!(
                "cooldown ({}s) must not be shorter than the time window ({}s)",
                cooldown_secs, self.time_window_secs
            )));
        }
        Ok(())
    }

    /// Like `validate`, plus the channel/author ids the live bridge needs.
    pub fn validate_for_bridge(&self) -> EngineResult<()> {
        self.validate()?;
        for (name, value) in [
            ("source_channel_id", &self.source_channel_id),
            ("source_author_id", &self.source_author_id),
            ("alert_channel_id", &self.alert_channel_id),
        ] {
            if value.is_empty() {
                return Err(EngineError::config(format!("{} is not set", name)));
            }
        }
        Ok(())
    }
}

/// `$CONFIG_DIR/trunkwatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trunkwatch").join("config.toml"))
}

/// `Duration` of `secs`, or `None` when chrono can't represent it.
fn seconds(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> EngineResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| EngineError::config(format!("{} is not a valid number: '{}'", key, raw)))
}
