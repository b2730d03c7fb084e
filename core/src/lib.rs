//! Prediction state machine for Croupier.
//!
//! Everything here is synchronous and deterministic. Time is passed in by the caller,
//! and outbound effects are returned as [`Reaction`] values for the owner to execute.

pub mod classify;
mod engine;
pub mod launch;
pub mod pause;
pub mod render;
mod settings;
pub mod slot;
mod stats;
pub mod verify;

pub use classify::Classifier;
pub use engine::{
    Engine, EngineError, EngineSnapshot, LaunchTicket, PauseView, PersistedState, Reaction,
    Resolution, SlotView,
};
pub use launch::LaunchDecision;
pub use pause::{
    DEFAULT_PAUSE_CYCLE_SECS, DEFAULT_PAUSE_THRESHOLD, PauseError, PauseSchedule, PauseScheduler,
};
pub use settings::{DEFAULT_MAX_OFFSET, EngineSettings};
pub use slot::{PredictionSlot, SlotError, SlotKeeper, SlotStatus};
pub use stats::Tally;
