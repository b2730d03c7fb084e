//! Card suits and the fixed cyclic table that assigns them to targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four symbolic categories a prediction can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Suit {
    Hearts,
    Spades,
    Diamonds,
    Clubs,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown suit: {0:?}")]
pub struct UnknownSuitError(pub String);

impl Suit {
    /// Canonical scan order used when reporting markers.
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Spades, Suit::Diamonds, Suit::Clubs];

    /// Canonical single-codepoint glyph.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Spades => '♠',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }

    /// Human-readable label used in published predictions.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Suit::Hearts => "♥️ Cœur",
            Suit::Spades => "♠️ Pique",
            Suit::Diamonds => "♦️ Carreau",
            Suit::Clubs => "♣️ Trèfle",
        }
    }

    #[must_use]
    pub const fn from_glyph(ch: char) -> Option<Suit> {
        match ch {
            '♥' | '❤' => Some(Suit::Hearts),
            '♠' => Some(Suit::Spades),
            '♦' => Some(Suit::Diamonds),
            '♣' => Some(Suit::Clubs),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Suit::Hearts => 0b0001,
            Suit::Spades => 0b0010,
            Suit::Diamonds => 0b0100,
            Suit::Clubs => 0b1000,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl FromStr for Suit {
    type Err = UnknownSuitError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Strip the emoji presentation selector so "♥️" and "♥" parse alike.
        let trimmed = raw.trim().trim_end_matches('\u{FE0F}');
        let mut chars = trimmed.chars();
        if let (Some(ch), None) = (chars.next(), chars.next())
            && let Some(suit) = Suit::from_glyph(ch)
        {
            return Ok(suit);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "hearts" | "heart" => Ok(Suit::Hearts),
            "spades" | "spade" => Ok(Suit::Spades),
            "diamonds" | "diamond" => Ok(Suit::Diamonds),
            "clubs" | "club" => Ok(Suit::Clubs),
            _ => Err(UnknownSuitError(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Suit {
    type Error = UnknownSuitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Suit> for String {
    fn from(value: Suit) -> Self {
        value.glyph().to_string()
    }
}

/// Set of suits observed in an event, iterated in [`Suit::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SuitSet(u8);

impl SuitSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, suit: Suit) {
        self.0 |= suit.bit();
    }

    #[must_use]
    pub const fn contains(self, suit: Suit) -> bool {
        self.0 & suit.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Suit> {
        Suit::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<Suit> for SuitSet {
    fn from_iter<I: IntoIterator<Item = Suit>>(iter: I) -> Self {
        let mut set = SuitSet::empty();
        for suit in iter {
            set.insert(suit);
        }
        set
    }
}

impl fmt::Display for SuitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, suit) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{suit}")?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("suit cycle must contain at least one suit")]
pub struct EmptySuitCycleError;

/// Non-empty, ordered sequence of suits assigned round-robin to valid targets.
///
/// Lengths 4 and 8 both occur in practice; any non-zero length is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Suit>", into = "Vec<Suit>")]
pub struct SuitCycle(Vec<Suit>);

impl SuitCycle {
    pub fn new(suits: Vec<Suit>) -> Result<Self, EmptySuitCycleError> {
        if suits.is_empty() {
            Err(EmptySuitCycleError)
        } else {
            Ok(Self(suits))
        }
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Suit {
        self.0[index % self.0.len()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Suit] {
        &self.0
    }
}

impl Default for SuitCycle {
    fn default() -> Self {
        Self(vec![
            Suit::Hearts,
            Suit::Diamonds,
            Suit::Clubs,
            Suit::Spades,
            Suit::Diamonds,
            Suit::Hearts,
            Suit::Spades,
            Suit::Clubs,
        ])
    }
}

impl TryFrom<Vec<Suit>> for SuitCycle {
    type Error = EmptySuitCycleError;

    fn try_from(value: Vec<Suit>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SuitCycle> for Vec<Suit> {
    fn from(value: SuitCycle) -> Self {
        value.0
    }
}
