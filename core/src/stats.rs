//! Cumulative win/loss counters.

use serde::{Deserialize, Serialize};

use croupier_types::Outcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    /// `wins_by_offset[k]` counts wins confirmed `k` numbers after the target.
    pub wins_by_offset: Vec<u32>,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Won(offset) => {
                self.wins += 1;
                let idx = usize::from(offset);
                if self.wins_by_offset.len() <= idx {
                    self.wins_by_offset.resize(idx + 1, 0);
                }
                self.wins_by_offset[idx] += 1;
            }
            Outcome::Lost => self.losses += 1,
        }
    }

    #[must_use]
    pub fn wins_at(&self, offset: u8) -> u32 {
        self.wins_by_offset
            .get(usize::from(offset))
            .copied()
            .unwrap_or(0)
    }

    /// Win percentage, `None` before the first resolution.
    #[must_use]
    pub fn win_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.wins) * 100.0 / f64::from(self.total))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_wins_by_offset() {
        let mut tally = Tally::default();
        tally.record(Outcome::Won(0));
        tally.record(Outcome::Won(2));
        tally.record(Outcome::Won(2));
        tally.record(Outcome::Lost);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.wins, 3);
        assert_eq!(tally.losses, 1);
        assert_eq!(tally.wins_at(0), 1);
        assert_eq!(tally.wins_at(1), 0);
        assert_eq!(tally.wins_at(2), 2);
        assert_eq!(tally.wins_at(9), 0);
        assert_eq!(tally.win_rate(), Some(75.0));
    }

    #[test]
    fn empty_tally_has_no_rate() {
        let mut tally = Tally::default();
        assert_eq!(tally.win_rate(), None);
        tally.record(Outcome::Lost);
        tally.reset();
        assert_eq!(tally, Tally::default());
    }
}
