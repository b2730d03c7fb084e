use std::time::Duration;

use croupier_types::NumberDomain;

use crate::pause::{DEFAULT_PAUSE_CYCLE_SECS, DEFAULT_PAUSE_THRESHOLD};

pub const DEFAULT_MAX_OFFSET: u8 = 3;

/// Validated knobs for one [`crate::Engine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub domain: NumberDomain,
    /// Last offset examined before a prediction is declared lost.
    pub max_offset: u8,
    /// Counted triggers per pause.
    pub pause_threshold: u32,
    pub pause_cycle: Vec<Duration>,
    /// Idle bound for the inactivity watchdog; `None` disables it.
    pub watchdog_idle: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            domain: NumberDomain::default(),
            max_offset: DEFAULT_MAX_OFFSET,
            pause_threshold: DEFAULT_PAUSE_THRESHOLD,
            pause_cycle: DEFAULT_PAUSE_CYCLE_SECS
                .iter()
                .map(|&s| Duration::from_secs(s))
                .collect(),
            watchdog_idle: None,
        }
    }
}
