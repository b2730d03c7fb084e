//! The single in-flight prediction and the set of already-used targets.
//!
//! At most one [`PredictionSlot`] is pending at any time. [`SlotKeeper`] is the only
//! place that can open, advance, resolve or clear it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use croupier_types::{GameNumber, Outcome, Suit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Resolved(Outcome),
}

/// One outstanding prediction.
///
/// `R` is whatever the outbound transport needs to amend the published message later;
/// the core never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionSlot<R> {
    pub target: GameNumber,
    pub suit: Suit,
    pub origin_trigger: GameNumber,
    pub check_offset: u8,
    pub outbound_ref: R,
    pub status: SlotStatus,
    pub opened_at: DateTime<Utc>,
    pub last_progress_at: DateTime<Utc>,
}

impl<R> PredictionSlot<R> {
    /// The only number this slot will react to next.
    #[must_use]
    pub fn expected(&self) -> GameNumber {
        self.target.plus(u32::from(self.check_offset))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, SlotStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("prediction {pending} is still pending")]
    Occupied { pending: GameNumber },
    #[error("no prediction is pending")]
    Empty,
    #[error("check offset already at maximum {max}")]
    OffsetExhausted { max: u8 },
}

#[derive(Debug)]
pub struct SlotKeeper<R> {
    active: Option<PredictionSlot<R>>,
    targeted: HashSet<GameNumber>,
}

impl<R> Default for SlotKeeper<R> {
    fn default() -> Self {
        Self {
            active: None,
            targeted: HashSet::new(),
        }
    }
}

impl<R> SlotKeeper<R> {
    #[must_use]
    pub fn active(&self) -> Option<&PredictionSlot<R>> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.active.is_none()
    }

    #[must_use]
    pub fn is_targeted(&self, target: GameNumber) -> bool {
        self.targeted.contains(&target)
    }

    #[must_use]
    pub fn targeted_count(&self) -> usize {
        self.targeted.len()
    }

    /// Open a new pending slot and remember its target.
    ///
    /// Rejected without any mutation while another slot is pending.
    pub fn create(
        &mut self,
        target: GameNumber,
        suit: Suit,
        origin_trigger: GameNumber,
        outbound_ref: R,
        now: DateTime<Utc>,
    ) -> Result<&PredictionSlot<R>, SlotError> {
        if let Some(slot) = &self.active {
            return Err(SlotError::Occupied {
                pending: slot.target,
            });
        }
        self.targeted.insert(target);
        let slot = self.active.insert(PredictionSlot {
            target,
            suit,
            origin_trigger,
            check_offset: 0,
            outbound_ref,
            status: SlotStatus::Pending,
            opened_at: now,
            last_progress_at: now,
        });
        Ok(&*slot)
    }

    /// Move the pending slot one number further.
    ///
    /// Fails once the offset has reached `max_offset`; the caller resolves as lost instead.
    pub fn advance(&mut self, max_offset: u8, now: DateTime<Utc>) -> Result<&PredictionSlot<R>, SlotError> {
        let slot = self.active.as_mut().ok_or(SlotError::Empty)?;
        if slot.check_offset >= max_offset {
            return Err(SlotError::OffsetExhausted { max: max_offset });
        }
        slot.check_offset += 1;
        slot.last_progress_at = now;
        Ok(&*slot)
    }

    /// Settle the pending slot and free it. The returned slot carries the outcome.
    pub fn resolve(&mut self, outcome: Outcome) -> Result<PredictionSlot<R>, SlotError> {
        let mut slot = self.active.take().ok_or(SlotError::Empty)?;
        slot.status = SlotStatus::Resolved(outcome);
        Ok(slot)
    }

    /// Drop the current slot whatever its state.
    pub fn clear(&mut self) -> Option<PredictionSlot<R>> {
        self.active.take()
    }

    pub fn clear_targeted(&mut self) {
        self.targeted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: u32) -> GameNumber {
        GameNumber::new(value).unwrap()
    }

    fn keeper_with_slot() -> SlotKeeper<u64> {
        let mut keeper = SlotKeeper::default();
        keeper
            .create(n(100), Suit::Hearts, n(99), 7, Utc::now())
            .unwrap();
        keeper
    }

    #[test]
    fn create_records_target_and_starts_at_zero() {
        let keeper = keeper_with_slot();
        let slot = keeper.active().unwrap();
        assert_eq!(slot.check_offset, 0);
        assert_eq!(slot.expected(), n(100));
        assert!(slot.is_pending());
        assert!(keeper.is_targeted(n(100)));
    }

    #[test]
    fn second_create_is_rejected_without_mutation() {
        let mut keeper = keeper_with_slot();
        let err = keeper
            .create(n(200), Suit::Clubs, n(199), 8, Utc::now())
            .unwrap_err();
        assert_eq!(err, SlotError::Occupied { pending: n(100) });
        let slot = keeper.active().unwrap();
        assert_eq!(slot.target, n(100));
        assert_eq!(slot.outbound_ref, 7);
        assert!(!keeper.is_targeted(n(200)));
    }

    #[test]
    fn advance_stops_at_max_offset() {
        let mut keeper = keeper_with_slot();
        for expected in 1..=3 {
            assert_eq!(keeper.advance(3, Utc::now()).unwrap().check_offset, expected);
        }
        assert_eq!(
            keeper.advance(3, Utc::now()).unwrap_err(),
            SlotError::OffsetExhausted { max: 3 }
        );
        assert_eq!(keeper.active().unwrap().expected(), n(103));
    }

    #[test]
    fn resolve_frees_the_slot_but_keeps_target() {
        let mut keeper = keeper_with_slot();
        let resolved = keeper.resolve(Outcome::Won(0)).unwrap();
        assert_eq!(resolved.status, SlotStatus::Resolved(Outcome::Won(0)));
        assert!(keeper.is_free());
        assert!(keeper.is_targeted(n(100)));
        assert!(
            keeper
                .create(n(200), Suit::Clubs, n(199), 9, Utc::now())
                .is_ok()
        );
    }

    #[test]
    fn operations_on_empty_keeper() {
        let mut keeper: SlotKeeper<u64> = SlotKeeper::default();
        assert_eq!(keeper.advance(3, Utc::now()).unwrap_err(), SlotError::Empty);
        assert_eq!(keeper.resolve(Outcome::Lost).unwrap_err(), SlotError::Empty);
        assert!(keeper.clear().is_none());
    }

    #[test]
    fn clear_is_unconditional() {
        let mut keeper = keeper_with_slot();
        keeper.advance(3, Utc::now()).unwrap();
        let cleared = keeper.clear().unwrap();
        assert_eq!(cleared.check_offset, 1);
        assert!(keeper.is_free());
        keeper.clear_targeted();
        assert_eq!(keeper.targeted_count(), 0);
    }
}
