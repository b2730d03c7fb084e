//! Verification of the pending prediction against the event stream.
//!
//! The walk is strictly linear: the slot only reacts to `target + check_offset`.
//! Any other number is inert, and a provisional copy of the expected number waits
//! for its settled version.

use chrono::{DateTime, Utc};

use croupier_types::{GameNumber, Outcome, ResultEvent};

use crate::slot::{PredictionSlot, SlotKeeper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStep<R> {
    /// The event is not the number the slot is waiting for.
    Skipped { expected: GameNumber },
    /// The expected number arrived but is still being edited.
    Deferred { expected: GameNumber },
    /// Suit absent; the slot now waits for `next`.
    Advanced {
        target: GameNumber,
        offset: u8,
        next: GameNumber,
    },
    /// The slot settled and was freed.
    Resolved {
        slot: PredictionSlot<R>,
        outcome: Outcome,
    },
}

/// Apply one event to the pending slot. Returns `None` when no slot is pending.
pub fn verify<R>(
    keeper: &mut SlotKeeper<R>,
    event: &ResultEvent,
    max_offset: u8,
    now: DateTime<Utc>,
) -> Option<VerifyStep<R>> {
    let slot = keeper.active()?;
    let expected = slot.expected();

    if event.number != expected {
        return Some(VerifyStep::Skipped { expected });
    }
    if !event.lifecycle.is_usable() {
        return Some(VerifyStep::Deferred { expected });
    }

    let settled = if event.markers.contains(slot.suit) {
        Some(Outcome::Won(slot.check_offset))
    } else if slot.check_offset < max_offset {
        None
    } else {
        Some(Outcome::Lost)
    };

    match settled {
        Some(outcome) => keeper
            .resolve(outcome)
            .ok()
            .map(|slot| VerifyStep::Resolved { slot, outcome }),
        None => keeper
            .advance(max_offset, now)
            .ok()
            .map(|slot| VerifyStep::Advanced {
                target: slot.target,
                offset: slot.check_offset,
                next: slot.expected(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotStatus;
    use croupier_types::{Lifecycle, Suit, SuitSet};

    fn n(value: u32) -> GameNumber {
        GameNumber::new(value).unwrap()
    }

    fn event(number: u32, lifecycle: Lifecycle, suits: &[Suit]) -> ResultEvent {
        ResultEvent::new(n(number), lifecycle, suits.iter().copied().collect::<SuitSet>())
    }

    fn keeper() -> SlotKeeper<()> {
        let mut keeper = SlotKeeper::default();
        keeper
            .create(n(100), Suit::Hearts, n(99), (), Utc::now())
            .unwrap();
        keeper
    }

    #[test]
    fn no_slot_means_nothing_to_verify() {
        let mut keeper: SlotKeeper<()> = SlotKeeper::default();
        let ev = event(100, Lifecycle::Finalized, &[Suit::Hearts]);
        assert!(verify(&mut keeper, &ev, 3, Utc::now()).is_none());
    }

    #[test]
    fn immediate_win() {
        let mut keeper = keeper();
        let ev = event(100, Lifecycle::Finalized, &[Suit::Hearts, Suit::Spades]);
        match verify(&mut keeper, &ev, 3, Utc::now()) {
            Some(VerifyStep::Resolved { slot, outcome }) => {
                assert_eq!(outcome, Outcome::Won(0));
                assert_eq!(slot.status, SlotStatus::Resolved(Outcome::Won(0)));
            }
            other => panic!("expected resolution, got {other:?}"),
        }
        assert!(keeper.is_free());
    }

    #[test]
    fn skipped_number_is_inert() {
        let mut keeper = keeper();
        let miss = event(100, Lifecycle::Finalized, &[Suit::Clubs]);
        verify(&mut keeper, &miss, 3, Utc::now());
        assert_eq!(keeper.active().unwrap().check_offset, 1);

        let jump = event(102, Lifecycle::Finalized, &[Suit::Hearts]);
        assert_eq!(
            verify(&mut keeper, &jump, 3, Utc::now()),
            Some(VerifyStep::Skipped { expected: n(101) })
        );
        let slot = keeper.active().unwrap();
        assert_eq!(slot.check_offset, 1);
        assert!(slot.is_pending());

        let past = event(99, Lifecycle::Finalized, &[Suit::Hearts]);
        assert_eq!(
            verify(&mut keeper, &past, 3, Utc::now()),
            Some(VerifyStep::Skipped { expected: n(101) })
        );
    }

    #[test]
    fn escalation_then_loss() {
        let mut keeper = keeper();
        for (number, offset) in [(100, 1u8), (101, 2), (102, 3)] {
            let ev = event(number, Lifecycle::Finalized, &[Suit::Spades, Suit::Clubs]);
            assert_eq!(
                verify(&mut keeper, &ev, 3, Utc::now()),
                Some(VerifyStep::Advanced {
                    target: n(100),
                    offset,
                    next: n(number + 1),
                })
            );
        }
        let last = event(103, Lifecycle::Finalized, &[Suit::Diamonds]);
        match verify(&mut keeper, &last, 3, Utc::now()) {
            Some(VerifyStep::Resolved { slot, outcome }) => {
                assert_eq!(outcome, Outcome::Lost);
                assert_eq!(slot.check_offset, 3);
            }
            other => panic!("expected loss, got {other:?}"),
        }
        assert!(keeper.is_free());
    }

    #[test]
    fn late_win_reports_offset() {
        let mut keeper = keeper();
        verify(&mut keeper, &event(100, Lifecycle::Plain, &[]), 3, Utc::now());
        verify(&mut keeper, &event(101, Lifecycle::Plain, &[]), 3, Utc::now());
        match verify(&mut keeper, &event(102, Lifecycle::Plain, &[Suit::Hearts]), 3, Utc::now()) {
            Some(VerifyStep::Resolved { outcome, .. }) => {
                assert_eq!(outcome, Outcome::Won(2));
            }
            other => panic!("expected win, got {other:?}"),
        }
    }

    #[test]
    fn provisional_expected_number_waits_for_finalized() {
        let mut keeper = keeper();
        let editing = event(100, Lifecycle::Provisional, &[Suit::Hearts]);
        assert_eq!(
            verify(&mut keeper, &editing, 3, Utc::now()),
            Some(VerifyStep::Deferred { expected: n(100) })
        );
        assert_eq!(keeper.active().unwrap().check_offset, 0);

        let settled = event(100, Lifecycle::Finalized, &[Suit::Hearts]);
        assert!(matches!(
            verify(&mut keeper, &settled, 3, Utc::now()),
            Some(VerifyStep::Resolved { .. })
        ));
    }

    #[test]
    fn zero_max_offset_loses_on_first_miss() {
        let mut keeper = keeper();
        let ev = event(100, Lifecycle::Finalized, &[Suit::Clubs]);
        assert!(matches!(
            verify(&mut keeper, &ev, 0, Utc::now()),
            Some(VerifyStep::Resolved {
                outcome: Outcome::Lost,
                ..
            })
        ));
    }
}
