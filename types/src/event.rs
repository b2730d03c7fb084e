//! Classified result events and prediction outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::number::GameNumber;
use crate::suit::SuitSet;

/// How settled an inbound event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Still being edited upstream; must not drive verification or launches.
    Provisional,
    /// Carries a settled sentinel.
    Finalized,
    /// Neither sentinel; usable as-is.
    Plain,
}

impl Lifecycle {
    /// Finalized and plain events may drive verification and launches.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        !matches!(self, Lifecycle::Provisional)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Provisional => "provisional",
            Lifecycle::Finalized => "finalized",
            Lifecycle::Plain => "plain",
        }
    }
}

/// Structured form of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEvent {
    pub number: GameNumber,
    pub lifecycle: Lifecycle,
    pub markers: SuitSet,
}

impl ResultEvent {
    #[must_use]
    pub const fn new(number: GameNumber, lifecycle: Lifecycle, markers: SuitSet) -> Self {
        Self {
            number,
            lifecycle,
            markers,
        }
    }
}

/// Terminal result of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The predicted suit appeared `offset` numbers after the target.
    Won(u8),
    Lost,
}

impl Outcome {
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Outcome::Won(_))
    }

    /// Short badge used in amended messages, e.g. `✅1️⃣` or `❌`.
    #[must_use]
    pub fn badge(self) -> String {
        match self {
            Outcome::Won(offset) => format!("✅{offset}\u{FE0F}\u{20E3}"),
            Outcome::Lost => "❌".to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Won(offset) => write!(f, "won at +{offset}"),
            Outcome::Lost => f.write_str("lost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_is_not_usable() {
        assert!(!Lifecycle::Provisional.is_usable());
        assert!(Lifecycle::Finalized.is_usable());
        assert!(Lifecycle::Plain.is_usable());
    }

    #[test]
    fn outcome_badges() {
        assert_eq!(Outcome::Won(0).badge(), "✅0️⃣");
        assert_eq!(Outcome::Won(3).badge(), "✅3️⃣");
        assert_eq!(Outcome::Lost.badge(), "❌");
        assert_eq!(Outcome::Won(2).to_string(), "won at +2");
    }
}
