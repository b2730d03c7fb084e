//! Game numbers, the valid-target set and trigger rules.
//!
//! Everything here is a pure function of a [`NumberDomain`] built once at startup.
//! The domain is immutable afterwards, so it can be shared freely across threads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::suit::{Suit, SuitCycle};

/// Positive integer identifying one event in the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GameNumber(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("game numbers start at 1")]
pub struct ZeroGameNumberError;

impl GameNumber {
    pub const fn new(value: u32) -> Result<Self, ZeroGameNumberError> {
        if value == 0 {
            Err(ZeroGameNumberError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The number `offset` places after this one, saturating at `u32::MAX`.
    #[must_use]
    pub const fn plus(self, offset: u32) -> Self {
        Self(self.0.saturating_add(offset))
    }
}

impl TryFrom<u32> for GameNumber {
    type Error = ZeroGameNumberError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GameNumber> for u32 {
    fn from(value: GameNumber) -> Self {
        value.0
    }
}

impl fmt::Display for GameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("target bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: u32, max: u32 },
    #[error("target bounds must start at 1 or above")]
    ZeroMin,
    #[error("target bounds {min}..={max} contain no valid target")]
    NoValidTargets { min: u32, max: u32 },
    #[error("unknown trigger rule: {0:?}")]
    UnknownTriggerRule(String),
}

/// Closed interval `[min, max]` that valid targets must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBounds {
    min: u32,
    max: u32,
}

impl TargetBounds {
    pub const DEFAULT_MIN: u32 = 6;
    pub const DEFAULT_MAX: u32 = 1436;

    pub const fn new(min: u32, max: u32) -> Result<Self, DomainError> {
        if min == 0 {
            return Err(DomainError::ZeroMin);
        }
        if min > max {
            return Err(DomainError::InvertedBounds { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(self) -> u32 {
        self.min
    }

    #[must_use]
    pub const fn max(self) -> u32 {
        self.max
    }
}

impl Default for TargetBounds {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// How an observed number selects the number to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRule {
    /// `n` triggers iff `n + 1` is a valid target.
    ///
    /// A valid target is even and does not end in 0, so this already forces `n`
    /// to be odd with a last digit of 1, 3, 5 or 7.
    #[default]
    #[serde(alias = "strict")]
    Successor,
    /// Any `n` below the last valid target triggers; the target is the first
    /// valid number strictly after `n`, regardless of parity.
    NextValid,
}

impl TriggerRule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TriggerRule::Successor => "successor",
            TriggerRule::NextValid => "next_valid",
        }
    }
}

impl FromStr for TriggerRule {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "successor" | "strict" => Ok(TriggerRule::Successor),
            "next_valid" | "next-valid" => Ok(TriggerRule::NextValid),
            other => Err(DomainError::UnknownTriggerRule(other.to_string())),
        }
    }
}

/// A number eligible to be predicted: even, not a multiple of ten, within bounds.
#[must_use]
pub const fn is_valid_in(bounds: TargetBounds, n: u32) -> bool {
    n >= bounds.min && n <= bounds.max && n % 2 == 0 && n % 10 != 0
}

/// Precomputed valid-target table with its suit assignment.
///
/// `positions[n - min]` holds the index of `n` in the sorted valid list, which makes
/// membership and suit lookup O(1).
#[derive(Debug, Clone)]
pub struct NumberDomain {
    bounds: TargetBounds,
    rule: TriggerRule,
    cycle: SuitCycle,
    valid: Vec<u32>,
    positions: Vec<Option<u32>>,
}

impl NumberDomain {
    pub fn new(bounds: TargetBounds, cycle: SuitCycle, rule: TriggerRule) -> Result<Self, DomainError> {
        let span = (bounds.max - bounds.min) as usize + 1;
        let mut valid = Vec::new();
        let mut positions = Vec::with_capacity(span);
        for n in bounds.min..=bounds.max {
            if is_valid_in(bounds, n) {
                positions.push(Some(valid.len() as u32));
                valid.push(n);
            } else {
                positions.push(None);
            }
        }
        if valid.is_empty() {
            return Err(DomainError::NoValidTargets {
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(Self {
            bounds,
            rule,
            cycle,
            valid,
            positions,
        })
    }

    #[must_use]
    pub fn bounds(&self) -> TargetBounds {
        self.bounds
    }

    #[must_use]
    pub fn rule(&self) -> TriggerRule {
        self.rule
    }

    #[must_use]
    pub fn cycle(&self) -> &SuitCycle {
        &self.cycle
    }

    /// Sorted list of every valid target.
    #[must_use]
    pub fn valid_targets(&self) -> &[u32] {
        &self.valid
    }

    fn position(&self, n: u32) -> Option<usize> {
        let offset = n.checked_sub(self.bounds.min)?;
        self.positions
            .get(offset as usize)
            .copied()
            .flatten()
            .map(|p| p as usize)
    }

    #[must_use]
    pub fn is_valid_target(&self, n: GameNumber) -> bool {
        self.position(n.get()).is_some()
    }

    /// Suit assigned to `n`, or `None` when `n` is not a valid target.
    #[must_use]
    pub fn suit_for(&self, n: GameNumber) -> Option<Suit> {
        self.position(n.get()).map(|idx| self.cycle.at(idx))
    }

    #[must_use]
    pub fn is_trigger(&self, n: GameNumber) -> bool {
        self.trigger_target(n).is_some()
    }

    /// The number `n` asks us to predict, if `n` is a trigger.
    #[must_use]
    pub fn trigger_target(&self, n: GameNumber) -> Option<GameNumber> {
        match self.rule {
            TriggerRule::Successor => {
                let next = n.plus(1);
                (next != n && self.is_valid_target(next)).then_some(next)
            }
            TriggerRule::NextValid => {
                let idx = self.valid.partition_point(|&v| v <= n.get());
                self.valid.get(idx).map(|&v| GameNumber(v))
            }
        }
    }
}

impl Default for NumberDomain {
    fn default() -> Self {
        Self::new(
            TargetBounds::default(),
            SuitCycle::default(),
            TriggerRule::default(),
        )
        .expect("default bounds contain valid targets")
    }
}
