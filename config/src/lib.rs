//! Configuration file for Croupier.
//!
//! Read from `~/.croupier/config.toml`, or from the file named by `CROUPIER_CONFIG`.
//! Every section is optional; a missing file means defaults everywhere.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use croupier_core::{DEFAULT_MAX_OFFSET, DEFAULT_PAUSE_CYCLE_SECS, DEFAULT_PAUSE_THRESHOLD, EngineSettings};
use croupier_types::{NumberDomain, Suit, SuitCycle, TargetBounds, TriggerRule};
use croupier_utils::{DurationParseError, parse_duration};

pub const CONFIG_ENV: &str = "CROUPIER_CONFIG";
const STATE_FILE: &str = "state.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CroupierConfig {
    pub numbers: Option<NumbersConfig>,
    pub suits: Option<SuitsConfig>,
    pub trigger: Option<TriggerConfig>,
    pub verification: Option<VerificationConfig>,
    pub pause: Option<PauseConfig>,
    pub watchdog: Option<WatchdogConfig>,
    pub storage: Option<StorageConfig>,
    pub retry: Option<RetrySection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NumbersConfig {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuitsConfig {
    /// Suits assigned round-robin over the valid targets, e.g. `["♥", "♦", "♣", "♠"]`.
    pub cycle: Option<Vec<Suit>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub rule: TriggerRule,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerificationConfig {
    pub max_offset: Option<u8>,
}

/// One pause length: a bare integer is minutes, a string may carry a unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PauseLength {
    Minutes(u64),
    Text(String),
}

impl PauseLength {
    fn to_duration(&self) -> Result<Duration, DurationParseError> {
        match self {
            PauseLength::Minutes(0) => Err(DurationParseError::Zero("0".to_string())),
            PauseLength::Minutes(m) => Ok(Duration::from_secs(m.saturating_mul(60))),
            PauseLength::Text(raw) => parse_duration(raw),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PauseConfig {
    pub threshold: Option<u32>,
    pub cycle: Option<Vec<PauseLength>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchdogConfig {
    /// Force-stop a prediction that has not progressed for this many minutes.
    pub idle_minutes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// `${VAR}` references and a leading `~` are expanded.
    pub state_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrySection {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// Replace every `${NAME}` with the environment value (empty when unset).
///
/// An unterminated `${` is kept verbatim.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if !name.is_empty() {
            out.push_str(&env::var(name).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_env_vars(raw);
    match expanded.strip_prefix("~/") {
        Some(tail) => dirs::home_dir().map_or_else(|| PathBuf::from(&expanded), |home| home.join(tail)),
        None => PathBuf::from(expanded),
    }
}

/// `~/.croupier`, where the default config, state and logs live.
#[must_use]
pub fn croupier_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".croupier"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => croupier_dir().map(|dir| dir.join("config.toml")),
    }
}

impl CroupierConfig {
    /// Load the default config file. `Ok(None)` when there is none.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Validate and convert into engine settings.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let numbers = self.numbers.as_ref();
        let bounds = TargetBounds::new(
            numbers
                .and_then(|n| n.min)
                .unwrap_or(TargetBounds::DEFAULT_MIN),
            numbers
                .and_then(|n| n.max)
                .unwrap_or(TargetBounds::DEFAULT_MAX),
        )
        .map_err(|e| ConfigError::invalid("numbers", e))?;

        let cycle = match self.suits.as_ref().and_then(|s| s.cycle.clone()) {
            Some(suits) => SuitCycle::new(suits).map_err(|e| ConfigError::invalid("suits.cycle", e))?,
            None => SuitCycle::default(),
        };
        let rule = self.trigger.as_ref().map(|t| t.rule).unwrap_or_default();
        let domain =
            NumberDomain::new(bounds, cycle, rule).map_err(|e| ConfigError::invalid("numbers", e))?;

        let max_offset = self
            .verification
            .as_ref()
            .and_then(|v| v.max_offset)
            .unwrap_or(DEFAULT_MAX_OFFSET);

        let pause = self.pause.as_ref();
        let pause_threshold = pause
            .and_then(|p| p.threshold)
            .unwrap_or(DEFAULT_PAUSE_THRESHOLD);
        if pause_threshold == 0 {
            return Err(ConfigError::invalid("pause.threshold", "must be at least 1"));
        }
        let pause_cycle = match pause.and_then(|p| p.cycle.as_ref()) {
            Some(entries) if entries.is_empty() => {
                return Err(ConfigError::invalid("pause.cycle", "must not be empty"));
            }
            Some(entries) => entries
                .iter()
                .map(PauseLength::to_duration)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::invalid("pause.cycle", e))?,
            None => DEFAULT_PAUSE_CYCLE_SECS
                .iter()
                .map(|&s| Duration::from_secs(s))
                .collect(),
        };

        let watchdog_idle = match self.watchdog.as_ref().and_then(|w| w.idle_minutes) {
            Some(0) => {
                return Err(ConfigError::invalid("watchdog.idle_minutes", "must be at least 1"));
            }
            Some(minutes) => Some(Duration::from_secs(minutes.saturating_mul(60))),
            None => None,
        };

        Ok(EngineSettings {
            domain,
            max_offset,
            pause_threshold,
            pause_cycle,
            watchdog_idle,
        })
    }

    /// Where persisted state lives. `None` only when no home directory is known and
    /// no path is configured.
    #[must_use]
    pub fn state_path(&self) -> Option<PathBuf> {
        match self.storage.as_ref().and_then(|s| s.state_path.as_deref()) {
            Some(raw) => Some(expand_path(raw)),
            None => croupier_dir().map(|dir| dir.join(STATE_FILE)),
        }
    }
}
