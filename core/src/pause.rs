//! Cyclic cool-down scheduler.
//!
//! After `threshold` counted triggers the next one starts a pause instead of a
//! prediction. Pause lengths come from a configured cycle used round-robin.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAUSE_THRESHOLD: u32 = 5;
pub const DEFAULT_PAUSE_CYCLE_SECS: [u64; 3] = [180, 300, 240];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PauseError {
    #[error("pause cycle must contain at least one duration")]
    EmptyCycle,
    #[error("pause durations must be at least one second")]
    ZeroDuration,
}

/// Persisted pause state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSchedule {
    pub cycle_secs: Vec<u64>,
    pub cycle_index: usize,
    pub predictions_since_reset: u32,
    pub paused_until: Option<DateTime<Utc>>,
    /// Set when a pause is observed to have ended, until someone takes it.
    #[serde(default)]
    pub just_resumed: bool,
}

impl Default for PauseSchedule {
    fn default() -> Self {
        Self {
            cycle_secs: DEFAULT_PAUSE_CYCLE_SECS.to_vec(),
            cycle_index: 0,
            predictions_since_reset: 0,
            paused_until: None,
            just_resumed: false,
        }
    }
}

fn validate_cycle(cycle: &[Duration]) -> Result<Vec<u64>, PauseError> {
    if cycle.is_empty() {
        return Err(PauseError::EmptyCycle);
    }
    cycle
        .iter()
        .map(|d| match d.as_secs() {
            0 => Err(PauseError::ZeroDuration),
            secs => Ok(secs),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PauseScheduler {
    schedule: PauseSchedule,
    threshold: u32,
}

impl Default for PauseScheduler {
    fn default() -> Self {
        Self {
            schedule: PauseSchedule::default(),
            threshold: DEFAULT_PAUSE_THRESHOLD,
        }
    }
}

impl PauseScheduler {
    pub fn new(cycle: &[Duration], threshold: u32) -> Result<Self, PauseError> {
        Ok(Self {
            schedule: PauseSchedule {
                cycle_secs: validate_cycle(cycle)?,
                ..PauseSchedule::default()
            },
            threshold: threshold.max(1),
        })
    }

    /// Rebuild from persisted state. A corrupt (empty or zero) cycle falls back to
    /// the defaults rather than poisoning the round-robin.
    #[must_use]
    pub fn restore(mut schedule: PauseSchedule, threshold: u32) -> Self {
        if schedule.cycle_secs.is_empty() || schedule.cycle_secs.contains(&0) {
            tracing::warn!(
                cycle = ?schedule.cycle_secs,
                "Persisted pause cycle is invalid; using defaults"
            );
            schedule.cycle_secs = DEFAULT_PAUSE_CYCLE_SECS.to_vec();
            schedule.cycle_index = 0;
        }
        Self {
            schedule,
            threshold: threshold.max(1),
        }
    }

    #[must_use]
    pub fn schedule(&self) -> &PauseSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[must_use]
    pub fn cycle(&self) -> Vec<Duration> {
        self.schedule
            .cycle_secs
            .iter()
            .map(|&s| Duration::from_secs(s))
            .collect()
    }

    /// True while `now` is before the pause end.
    ///
    /// The first call that sees the pause over clears it and raises `just_resumed`.
    pub fn is_paused(&mut self, now: DateTime<Utc>) -> bool {
        match self.schedule.paused_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.schedule.paused_until = None;
                self.schedule.just_resumed = true;
                tracing::info!("Pause over, resuming predictions");
                false
            }
            None => false,
        }
    }

    /// Time left in the current pause without touching any state.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.schedule.paused_until?;
        (until - now).to_std().ok().filter(|d| !d.is_zero())
    }

    pub fn take_just_resumed(&mut self) -> bool {
        std::mem::take(&mut self.schedule.just_resumed)
    }

    /// Count one more trigger. Returns true when this one must start a pause.
    pub fn count_trigger(&mut self) -> bool {
        self.schedule.predictions_since_reset += 1;
        self.schedule.predictions_since_reset >= self.threshold
    }

    /// Enter the next pause of the cycle and return its length.
    pub fn start_pause(&mut self, now: DateTime<Utc>) -> Duration {
        let cycle = &self.schedule.cycle_secs;
        let secs = cycle[self.schedule.cycle_index % cycle.len()];
        let delta = TimeDelta::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
            .unwrap_or(TimeDelta::MAX);
        self.schedule.paused_until = Some(
            now.checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        self.schedule.cycle_index = (self.schedule.cycle_index + 1) % cycle.len();
        self.schedule.predictions_since_reset = 0;
        self.schedule.just_resumed = false;
        Duration::from_secs(secs)
    }

    /// Replace the cycle and restart the round-robin from its first entry.
    pub fn reconfigure(&mut self, cycle: &[Duration]) -> Result<(), PauseError> {
        self.schedule.cycle_secs = validate_cycle(cycle)?;
        self.schedule.cycle_index = 0;
        Ok(())
    }

    /// The next `count` pause lengths in the order they will be used.
    #[must_use]
    pub fn upcoming(&self, count: usize) -> Vec<Duration> {
        let cycle = &self.schedule.cycle_secs;
        (0..count)
            .map(|i| Duration::from_secs(cycle[(self.schedule.cycle_index + i) % cycle.len()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&s| Duration::from_secs(s)).collect()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn pause_durations_round_robin() {
        let mut p = PauseScheduler::new(&secs(&[180, 240, 420]), 5).unwrap();
        let now = t0();
        let used: Vec<u64> = (0..4).map(|_| p.start_pause(now).as_secs()).collect();
        assert_eq!(used, vec![180, 240, 420, 180]);
    }

    #[test]
    fn start_pause_resets_counter_and_sets_deadline() {
        let mut p = PauseScheduler::new(&secs(&[60]), 3).unwrap();
        assert!(!p.count_trigger());
        assert!(!p.count_trigger());
        assert!(p.count_trigger());
        let d = p.start_pause(t0());
        assert_eq!(d, Duration::from_secs(60));
        assert_eq!(p.schedule().predictions_since_reset, 0);
        assert_eq!(
            p.schedule().paused_until,
            Some(t0() + TimeDelta::seconds(60))
        );
    }

    #[test]
    fn is_paused_flips_just_resumed_once() {
        let mut p = PauseScheduler::new(&secs(&[60]), 5).unwrap();
        p.start_pause(t0());
        assert!(p.is_paused(t0() + TimeDelta::seconds(59)));
        assert!(!p.take_just_resumed());
        assert!(!p.is_paused(t0() + TimeDelta::seconds(60)));
        assert!(p.schedule().paused_until.is_none());
        assert!(p.take_just_resumed());
        assert!(!p.take_just_resumed());
        assert!(!p.is_paused(t0() + TimeDelta::seconds(61)));
        assert!(!p.take_just_resumed());
    }

    #[test]
    fn remaining_has_no_side_effects() {
        let mut p = PauseScheduler::new(&secs(&[120]), 5).unwrap();
        p.start_pause(t0());
        assert_eq!(
            p.remaining(t0() + TimeDelta::seconds(20)),
            Some(Duration::from_secs(100))
        );
        assert_eq!(p.remaining(t0() + TimeDelta::seconds(500)), None);
        assert!(p.schedule().paused_until.is_some());
    }

    #[test]
    fn reconfigure_restarts_cycle() {
        let mut p = PauseScheduler::new(&secs(&[180, 240, 420]), 5).unwrap();
        p.start_pause(t0());
        p.start_pause(t0());
        p.reconfigure(&secs(&[60, 90])).unwrap();
        assert_eq!(p.schedule().cycle_index, 0);
        assert_eq!(p.upcoming(3), secs(&[60, 90, 60]));
        assert_eq!(p.start_pause(t0()), Duration::from_secs(60));
    }

    #[test]
    fn invalid_cycles_are_rejected() {
        assert_eq!(
            PauseScheduler::new(&[], 5).unwrap_err(),
            PauseError::EmptyCycle
        );
        let mut p = PauseScheduler::default();
        assert_eq!(
            p.reconfigure(&[Duration::from_millis(500)]).unwrap_err(),
            PauseError::ZeroDuration
        );
        assert_eq!(p.cycle(), secs(&DEFAULT_PAUSE_CYCLE_SECS));
    }

    #[test]
    fn restore_repairs_empty_cycle() {
        let schedule = PauseSchedule {
            cycle_secs: Vec::new(),
            cycle_index: 4,
            ..PauseSchedule::default()
        };
        let p = PauseScheduler::restore(schedule, 5);
        assert_eq!(p.cycle(), secs(&DEFAULT_PAUSE_CYCLE_SECS));
        assert_eq!(p.schedule().cycle_index, 0);
    }
}
