//! The single owner of all prediction state.
//!
//! [`Engine`] is deliberately synchronous and clock-free: every call takes `now`, and
//! outbound IO is left to the caller through [`Reaction`] values. Whoever holds the
//! engine is the serialization point; nothing else may touch the slot or the pause
//! schedule.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use croupier_types::{GameNumber, NumberDomain, Outcome, ResultEvent, Suit};

use crate::classify::Classifier;
use crate::launch::{self, LaunchDecision, LaunchGate};
use crate::pause::{PauseError, PauseSchedule, PauseScheduler};
use crate::settings::EngineSettings;
use crate::slot::{PredictionSlot, SlotError, SlotKeeper};
use crate::stats::Tally;
use crate::verify::{self, VerifyStep};

/// How many upcoming pause durations a snapshot previews.
const SNAPSHOT_UPCOMING: usize = 3;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Pause(#[from] PauseError),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("launch ticket {serial} is stale")]
    StaleTicket { serial: u64 },
}

/// Permission to publish one prediction.
///
/// Only the engine mints tickets, and only one is outstanding at a time; while it is,
/// the slot counts as busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTicket {
    serial: u64,
    target: GameNumber,
    suit: Suit,
    trigger: GameNumber,
}

impl LaunchTicket {
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    #[must_use]
    pub fn target(&self) -> GameNumber {
        self.target
    }

    #[must_use]
    pub fn suit(&self) -> Suit {
        self.suit
    }

    #[must_use]
    pub fn trigger(&self) -> GameNumber {
        self.trigger
    }
}

/// A settled prediction, ready to be amended downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<R> {
    pub target: GameNumber,
    pub suit: Suit,
    pub outcome: Outcome,
    pub outbound_ref: R,
}

/// What the owner must do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction<R> {
    /// The text carried no game number.
    Noise,
    /// A slot is pending and this number is not the one it waits for.
    Skipped { number: GameNumber, expected: GameNumber },
    /// The expected number arrived provisional.
    Deferred { expected: GameNumber },
    Advanced {
        target: GameNumber,
        offset: u8,
        next: GameNumber,
    },
    /// Amend the published prediction with the outcome.
    Resolved(Resolution<R>),
    /// No slot was pending and the launch policy declined.
    Held(LaunchDecision),
    /// Announce a pause of this length.
    PauseStarted { duration: Duration },
    /// Publish the prediction, then commit or abandon the ticket.
    Launch(LaunchTicket),
}

/// State that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub pause: PauseSchedule,
    #[serde(default)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub target: GameNumber,
    pub suit: Suit,
    pub origin_trigger: GameNumber,
    pub check_offset: u8,
    pub expected: GameNumber,
    pub opened_at: DateTime<Utc>,
    pub last_progress_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PauseView {
    pub paused: bool,
    pub remaining: Option<Duration>,
    pub predictions_since_reset: u32,
    pub threshold: u32,
    pub cycle: Vec<Duration>,
    pub upcoming: Vec<Duration>,
}

/// Read-only diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub enabled: bool,
    pub slot: Option<SlotView>,
    pub launch_outstanding: Option<GameNumber>,
    pub pause: PauseView,
    pub tally: Tally,
    pub max_offset: u8,
    pub last_seen: Option<GameNumber>,
    pub targeted_count: usize,
}

#[derive(Debug)]
pub struct Engine<R> {
    domain: NumberDomain,
    max_offset: u8,
    watchdog_idle: Option<Duration>,
    classifier: Classifier,
    slots: SlotKeeper<R>,
    pause: PauseScheduler,
    tally: Tally,
    enabled: bool,
    last_seen: Option<GameNumber>,
    outstanding: Option<LaunchTicket>,
    next_serial: u64,
    dirty: bool,
}

impl<R> Engine<R> {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let pause = PauseScheduler::new(&settings.pause_cycle, settings.pause_threshold)?;
        Ok(Self::assemble(settings, pause, Tally::default()))
    }

    /// Rebuild from persisted state. The stored pause cycle wins over the configured
    /// one, since it may have been reconfigured at runtime.
    #[must_use]
    pub fn restore(settings: EngineSettings, state: PersistedState) -> Self {
        let pause = PauseScheduler::restore(state.pause, settings.pause_threshold);
        Self::assemble(settings, pause, state.tally)
    }

    fn assemble(settings: EngineSettings, pause: PauseScheduler, tally: Tally) -> Self {
        Self {
            domain: settings.domain,
            max_offset: settings.max_offset,
            watchdog_idle: settings.watchdog_idle,
            classifier: Classifier::new(),
            slots: SlotKeeper::default(),
            pause,
            tally,
            enabled: true,
            last_seen: None,
            outstanding: None,
            next_serial: 0,
            dirty: false,
        }
    }

    #[must_use]
    pub fn domain(&self) -> &NumberDomain {
        &self.domain
    }

    #[must_use]
    pub fn max_offset(&self) -> u8 {
        self.max_offset
    }

    #[must_use]
    pub fn active_slot(&self) -> Option<&PredictionSlot<R>> {
        self.slots.active()
    }

    #[must_use]
    pub fn predictions_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    #[must_use]
    pub fn watchdog_idle(&self) -> Option<Duration> {
        self.watchdog_idle
    }

    /// Classify raw text and react to it.
    pub fn observe(&mut self, text: &str, now: DateTime<Utc>) -> Reaction<R> {
        match self.classifier.classify(text) {
            Some(event) => self.observe_event(&event, now),
            None => {
                tracing::trace!("Discarding text without a game number");
                Reaction::Noise
            }
        }
    }

    /// React to an already classified event.
    ///
    /// With a slot pending only verification runs; otherwise only the launch policy.
    pub fn observe_event(&mut self, event: &ResultEvent, now: DateTime<Utc>) -> Reaction<R> {
        tracing::debug!(
            number = event.number.get(),
            lifecycle = event.lifecycle.as_str(),
            markers = %event.markers,
            "Event"
        );
        self.last_seen = Some(event.number);

        if let Some(step) = verify::verify(&mut self.slots, event, self.max_offset, now) {
            return self.apply_step(event.number, step);
        }

        let gate = LaunchGate {
            enabled: self.enabled,
            reserved: self.outstanding.is_some(),
        };
        let decision = launch::decide(&self.domain, &self.slots, &mut self.pause, gate, event, now);
        if self.pause.take_just_resumed() {
            tracing::info!(number = event.number.get(), "Predictions resumed after pause");
            self.dirty = true;
        }
        match decision {
            LaunchDecision::Launch {
                target,
                suit,
                trigger,
            } => {
                self.dirty = true;
                self.next_serial += 1;
                let ticket = LaunchTicket {
                    serial: self.next_serial,
                    target,
                    suit,
                    trigger,
                };
                tracing::info!(
                    target = target.get(),
                    suit = %suit,
                    trigger = trigger.get(),
                    count = self.pause.schedule().predictions_since_reset,
                    "Launching prediction"
                );
                self.outstanding = Some(ticket.clone());
                Reaction::Launch(ticket)
            }
            LaunchDecision::PauseStarted { duration } => {
                self.dirty = true;
                tracing::info!(
                    duration_secs = duration.as_secs(),
                    trigger = event.number.get(),
                    "Pause started"
                );
                Reaction::PauseStarted { duration }
            }
            other => {
                tracing::trace!(number = event.number.get(), decision = ?other, "No launch");
                Reaction::Held(other)
            }
        }
    }

    fn apply_step(&mut self, number: GameNumber, step: VerifyStep<R>) -> Reaction<R> {
        match step {
            VerifyStep::Skipped { expected } => {
                tracing::debug!(number = number.get(), expected = expected.get(), "Not the expected number");
                Reaction::Skipped { number, expected }
            }
            VerifyStep::Deferred { expected } => {
                tracing::info!(number = expected.get(), "Expected number still being edited");
                Reaction::Deferred { expected }
            }
            VerifyStep::Advanced {
                target,
                offset,
                next,
            } => {
                tracing::info!(
                    target = target.get(),
                    offset,
                    next = next.get(),
                    "Suit absent, checking next number"
                );
                Reaction::Advanced {
                    target,
                    offset,
                    next,
                }
            }
            VerifyStep::Resolved { slot, outcome } => {
                let resolution = Resolution {
                    target: slot.target,
                    suit: slot.suit,
                    outcome,
                    outbound_ref: slot.outbound_ref,
                };
                self.tally.record(resolution.outcome);
                self.dirty = true;
                tracing::info!(
                    target = resolution.target.get(),
                    outcome = %resolution.outcome,
                    total = self.tally.total,
                    "Prediction resolved"
                );
                Reaction::Resolved(resolution)
            }
        }
    }

    /// Open the slot for a published prediction.
    pub fn commit_launch(
        &mut self,
        ticket: &LaunchTicket,
        outbound_ref: R,
        now: DateTime<Utc>,
    ) -> Result<&PredictionSlot<R>, EngineError> {
        self.take_ticket(ticket)?;
        let slot = self
            .slots
            .create(ticket.target, ticket.suit, ticket.trigger, outbound_ref, now)
            .inspect_err(|e| tracing::error!(target = ticket.target.get(), "Slot create rejected: {e}"))?;
        tracing::info!(
            target = slot.target.get(),
            suit = %slot.suit,
            "Prediction pending, waiting for {}",
            slot.expected()
        );
        Ok(slot)
    }

    /// The publish failed: release the reservation without opening a slot.
    ///
    /// The target stays available. The pause counter increment stands.
    pub fn abandon_launch(&mut self, ticket: &LaunchTicket) -> Result<(), EngineError> {
        self.take_ticket(ticket)?;
        tracing::warn!(target = ticket.target.get(), "Launch abandoned");
        Ok(())
    }

    fn take_ticket(&mut self, ticket: &LaunchTicket) -> Result<(), EngineError> {
        match &self.outstanding {
            Some(held) if held.serial == ticket.serial => {
                self.outstanding = None;
                Ok(())
            }
            _ => Err(EngineError::StaleTicket {
                serial: ticket.serial,
            }),
        }
    }

    /// Drop the pending slot whatever its state. Returns the cleared target.
    ///
    /// Any outstanding launch ticket is invalidated too.
    pub fn clear_slot(&mut self) -> Option<GameNumber> {
        self.outstanding = None;
        let cleared = self.slots.clear().map(|slot| slot.target);
        if let Some(target) = cleared {
            tracing::warn!(target = target.get(), "Slot cleared");
        }
        cleared
    }

    pub fn set_predictions_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!(enabled, "Predictions toggled");
        }
        self.enabled = enabled;
    }

    /// Disable predictions, clear the slot and forget every used target.
    pub fn force_stop(&mut self) -> Option<GameNumber> {
        self.enabled = false;
        let cleared = self.clear_slot();
        self.slots.clear_targeted();
        tracing::warn!(cleared = cleared.map(GameNumber::get), "Force stop");
        cleared
    }

    /// Zero the statistics and start a fresh episode. The pause configuration and the
    /// enabled flag are kept.
    pub fn reset(&mut self) {
        self.tally.reset();
        self.clear_slot();
        self.slots.clear_targeted();
        self.dirty = true;
        tracing::info!("Statistics and targets reset");
    }

    pub fn reconfigure_pause_cycle(&mut self, cycle: &[Duration]) -> Result<(), EngineError> {
        self.pause.reconfigure(cycle)?;
        self.dirty = true;
        tracing::info!(cycle = ?self.pause.schedule().cycle_secs, "Pause cycle reconfigured");
        Ok(())
    }

    /// Force-stop when the pending slot has made no progress for the idle bound.
    ///
    /// Returns the cleared target when the watchdog fired.
    pub fn watchdog_tick(&mut self, now: DateTime<Utc>) -> Option<GameNumber> {
        let idle = self.watchdog_idle?;
        let slot = self.slots.active()?;
        let stalled = (now - slot.last_progress_at).to_std().ok()?;
        if stalled < idle {
            return None;
        }
        tracing::warn!(
            target = slot.target.get(),
            idle_secs = stalled.as_secs(),
            "Verification stalled, watchdog firing"
        );
        self.force_stop()
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> EngineSnapshot {
        let schedule = self.pause.schedule();
        let remaining = self.pause.remaining(now);
        EngineSnapshot {
            enabled: self.enabled,
            slot: self.slots.active().map(|slot| SlotView {
                target: slot.target,
                suit: slot.suit,
                origin_trigger: slot.origin_trigger,
                check_offset: slot.check_offset,
                expected: slot.expected(),
                opened_at: slot.opened_at,
                last_progress_at: slot.last_progress_at,
            }),
            launch_outstanding: self.outstanding.as_ref().map(LaunchTicket::target),
            pause: PauseView {
                paused: remaining.is_some(),
                remaining,
                predictions_since_reset: schedule.predictions_since_reset,
                threshold: self.pause.threshold(),
                cycle: self.pause.cycle(),
                upcoming: self.pause.upcoming(SNAPSHOT_UPCOMING),
            },
            tally: self.tally.clone(),
            max_offset: self.max_offset,
            last_seen: self.last_seen,
            targeted_count: self.slots.targeted_count(),
        }
    }

    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            pause: self.pause.schedule().clone(),
            tally: self.tally.clone(),
        }
    }

    /// True once after any change to persisted state.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
