//! Core domain types for Croupier.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod event;
mod number;
mod suit;

pub use event::{Lifecycle, Outcome, ResultEvent};
pub use number::{
    DomainError, GameNumber, NumberDomain, TargetBounds, TriggerRule, ZeroGameNumberError,
    is_valid_in,
};
pub use suit::{EmptySuitCycleError, Suit, SuitCycle, SuitSet, UnknownSuitError};
