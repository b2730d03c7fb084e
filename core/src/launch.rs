//! Launch policy: may this event start a new prediction?

use std::time::Duration;

use chrono::{DateTime, Utc};

use croupier_types::{GameNumber, NumberDomain, ResultEvent, Suit};

use crate::pause::PauseScheduler;
use crate::slot::SlotKeeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchDecision {
    /// Predictions are switched off.
    Disabled,
    /// A slot is pending or a launch is waiting to be committed.
    SlotBusy,
    /// The event is still being edited upstream.
    Provisional,
    Paused { remaining: Option<Duration> },
    NotTrigger,
    AlreadyTargeted { target: GameNumber },
    /// The trigger was consumed by entering a pause.
    PauseStarted { duration: Duration },
    Launch {
        target: GameNumber,
        suit: Suit,
        trigger: GameNumber,
    },
}

/// Flags owned by the engine rather than by the slot or the pause scheduler.
#[derive(Debug, Clone, Copy)]
pub struct LaunchGate {
    pub enabled: bool,
    pub reserved: bool,
}

/// Evaluate the policy for one event. Only the pause scheduler is mutated:
/// its expiry check, its trigger counter, and possibly a new pause.
pub fn decide<R>(
    domain: &NumberDomain,
    keeper: &SlotKeeper<R>,
    pause: &mut PauseScheduler,
    gate: LaunchGate,
    event: &ResultEvent,
    now: DateTime<Utc>,
) -> LaunchDecision {
    if !gate.enabled {
        return LaunchDecision::Disabled;
    }
    if gate.reserved || !keeper.is_free() {
        return LaunchDecision::SlotBusy;
    }
    if !event.lifecycle.is_usable() {
        return LaunchDecision::Provisional;
    }
    if pause.is_paused(now) {
        return LaunchDecision::Paused {
            remaining: pause.remaining(now),
        };
    }
    let Some(target) = domain.trigger_target(event.number) else {
        return LaunchDecision::NotTrigger;
    };
    if keeper.is_targeted(target) {
        return LaunchDecision::AlreadyTargeted { target };
    }
    if pause.count_trigger() {
        return LaunchDecision::PauseStarted {
            duration: pause.start_pause(now),
        };
    }
    match domain.suit_for(target) {
        Some(suit) => LaunchDecision::Launch {
            target,
            suit,
            trigger: event.number,
        },
        // trigger_target only yields valid targets
        None => LaunchDecision::NotTrigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use croupier_types::{Lifecycle, SuitSet};

    fn n(value: u32) -> GameNumber {
        GameNumber::new(value).unwrap()
    }

    fn finalized(number: u32) -> ResultEvent {
        ResultEvent::new(n(number), Lifecycle::Finalized, SuitSet::empty())
    }

    const OPEN: LaunchGate = LaunchGate {
        enabled: true,
        reserved: false,
    };

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn trigger_launches_with_table_suit() {
        let domain = NumberDomain::default();
        let keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::default();
        let decision = decide(&domain, &keeper, &mut pause, OPEN, &finalized(11), t0());
        assert_eq!(
            decision,
            LaunchDecision::Launch {
                target: n(12),
                suit: domain.suit_for(n(12)).unwrap(),
                trigger: n(11),
            }
        );
        assert_eq!(pause.schedule().predictions_since_reset, 1);
    }

    #[test]
    fn non_triggers_do_not_count() {
        let domain = NumberDomain::default();
        let keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::default();
        for number in [12, 19, 9, 1500] {
            assert_eq!(
                decide(&domain, &keeper, &mut pause, OPEN, &finalized(number), t0()),
                LaunchDecision::NotTrigger
            );
        }
        assert_eq!(pause.schedule().predictions_since_reset, 0);
    }

    #[test]
    fn gates_short_circuit_before_counting() {
        let domain = NumberDomain::default();
        let mut keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::default();
        let disabled = LaunchGate {
            enabled: false,
            reserved: false,
        };
        assert_eq!(
            decide(&domain, &keeper, &mut pause, disabled, &finalized(11), t0()),
            LaunchDecision::Disabled
        );
        let reserved = LaunchGate {
            enabled: true,
            reserved: true,
        };
        assert_eq!(
            decide(&domain, &keeper, &mut pause, reserved, &finalized(11), t0()),
            LaunchDecision::SlotBusy
        );
        keeper
            .create(n(22), Suit::Clubs, n(21), (), t0())
            .unwrap();
        assert_eq!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(11), t0()),
            LaunchDecision::SlotBusy
        );
        assert_eq!(pause.schedule().predictions_since_reset, 0);
    }

    #[test]
    fn provisional_events_never_launch() {
        let domain = NumberDomain::default();
        let keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::default();
        let event = ResultEvent::new(n(11), Lifecycle::Provisional, SuitSet::empty());
        assert_eq!(
            decide(&domain, &keeper, &mut pause, OPEN, &event, t0()),
            LaunchDecision::Provisional
        );
    }

    #[test]
    fn already_targeted_is_skipped() {
        let domain = NumberDomain::default();
        let mut keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::default();
        keeper
            .create(n(12), Suit::Hearts, n(11), (), t0())
            .unwrap();
        keeper.clear();
        assert_eq!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(11), t0()),
            LaunchDecision::AlreadyTargeted { target: n(12) }
        );
        assert_eq!(pause.schedule().predictions_since_reset, 0);
    }

    #[test]
    fn threshold_trigger_starts_pause_instead() {
        let domain = NumberDomain::default();
        let keeper: SlotKeeper<()> = SlotKeeper::default();
        let mut pause = PauseScheduler::new(&[Duration::from_secs(180)], 2).unwrap();
        assert!(matches!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(11), t0()),
            LaunchDecision::Launch { .. }
        ));
        assert_eq!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(13), t0()),
            LaunchDecision::PauseStarted {
                duration: Duration::from_secs(180)
            }
        );
        assert_eq!(pause.schedule().predictions_since_reset, 0);

        let during = t0() + TimeDelta::seconds(60);
        assert_eq!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(15), during),
            LaunchDecision::Paused {
                remaining: Some(Duration::from_secs(120))
            }
        );

        let after = t0() + TimeDelta::seconds(180);
        assert!(matches!(
            decide(&domain, &keeper, &mut pause, OPEN, &finalized(15), after),
            LaunchDecision::Launch { .. }
        ));
        assert!(pause.take_just_resumed());
    }
}
