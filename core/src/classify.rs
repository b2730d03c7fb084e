//! Event classification: raw message text into a [`ResultEvent`].
//!
//! The source format puts the game number behind a tag (`#N123`), the drawn cards
//! inside parentheses, and marks the message lifecycle with sentinel glyphs.
//! Only the first parenthesized group is read; later groups belong to the other
//! hand and are ignored on purpose.

use regex::Regex;

use croupier_types::{GameNumber, Lifecycle, ResultEvent, Suit, SuitSet};

/// Leading glyph of a message that is still being edited upstream.
pub const EDITING_SENTINEL: char = '⏰';
/// Glyphs that mark a settled message.
pub const SETTLED_SENTINELS: [char; 2] = ['✅', '🔰'];

/// Number extraction patterns, tried in order.
const NUMBER_PATTERNS: [&str; 5] = [
    r"(?i)#N\s*([0-9]+)",
    r"(?i)^#([0-9]+)",
    r"(?i)N\s*([0-9]+)",
    r"(?i)Numéro\s*([0-9]+)",
    r"(?i)Game\s*([0-9]+)",
];

const FIRST_GROUP_PATTERN: &str = r"\(([^)]+)\)";

/// Compiled classifier. Build once and reuse.
#[derive(Debug, Clone)]
pub struct Classifier {
    number_patterns: Vec<Regex>,
    first_group: Regex,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    #[must_use]
    pub fn new() -> Self {
        let number_patterns = NUMBER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("number pattern is a valid literal regex"))
            .collect();
        let first_group =
            Regex::new(FIRST_GROUP_PATTERN).expect("group pattern is a valid literal regex");
        Self {
            number_patterns,
            first_group,
        }
    }

    /// First number matched by the ordered pattern list.
    ///
    /// Zero or out-of-range digits yield `None`, as does text with no match at all.
    #[must_use]
    pub fn extract_number(&self, text: &str) -> Option<GameNumber> {
        let digits = self
            .number_patterns
            .iter()
            .find_map(|re| re.captures(text))?
            .get(1)?
            .as_str();
        let value: u32 = digits.parse().ok()?;
        GameNumber::new(value).ok()
    }

    /// Suits present in the first parenthesized group.
    ///
    /// Emoji variants (`❤️`, `♠️`, ...) collapse onto the canonical glyph because the
    /// presentation selector is simply skipped.
    #[must_use]
    pub fn extract_markers(&self, text: &str) -> SuitSet {
        let Some(group) = self
            .first_group
            .captures(text)
            .and_then(|caps| caps.get(1))
        else {
            return SuitSet::empty();
        };
        group.as_str().chars().filter_map(Suit::from_glyph).collect()
    }

    #[must_use]
    pub fn lifecycle_of(text: &str) -> Lifecycle {
        if text.trim_start().starts_with(EDITING_SENTINEL) {
            Lifecycle::Provisional
        } else if text.contains(SETTLED_SENTINELS) {
            Lifecycle::Finalized
        } else {
            Lifecycle::Plain
        }
    }

    /// Full classification. `None` means the text carries no game number and is noise.
    #[must_use]
    pub fn classify(&self, text: &str) -> Option<ResultEvent> {
        let number = self.extract_number(text)?;
        Some(ResultEvent::new(
            number,
            Self::lifecycle_of(text),
            self.extract_markers(text),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: u32) -> GameNumber {
        GameNumber::new(value).unwrap()
    }

    #[test]
    fn tagged_number_wins_over_fallbacks() {
        let c = Classifier::new();
        assert_eq!(c.extract_number("Game 7 #N 412 ✅"), Some(n(412)));
        assert_eq!(c.extract_number("#n88 (♥)"), Some(n(88)));
    }

    #[test]
    fn fallback_patterns() {
        let c = Classifier::new();
        assert_eq!(c.extract_number("#531 9(K♠) - 7(3♦)"), Some(n(531)));
        assert_eq!(c.extract_number("Numéro 77 terminé"), Some(n(77)));
        assert_eq!(c.extract_number("game 12"), Some(n(12)));
        assert_eq!(c.extract_number("no digits here"), None);
        assert_eq!(c.extract_number("#N0"), None);
        assert_eq!(c.extract_number("#N99999999999"), None);
    }

    #[test]
    fn markers_come_from_first_group_only() {
        let c = Classifier::new();
        let markers = c.extract_markers("#N100 ✅ 8(A♠️ 7❤️) - 6(K♦ 2♣)");
        assert_eq!(markers.iter().collect::<Vec<_>>(), vec![Suit::Hearts, Suit::Spades]);
        assert!(!markers.contains(Suit::Diamonds));
        assert!(c.extract_markers("#N100 no groups").is_empty());
    }

    #[test]
    fn marker_variants_normalize() {
        let c = Classifier::new();
        let markers = c.extract_markers("(♥️ ❤ ♦️ ♣️)");
        assert_eq!(
            markers.iter().collect::<Vec<_>>(),
            vec![Suit::Hearts, Suit::Diamonds, Suit::Clubs]
        );
    }

    #[test]
    fn lifecycle_sentinels() {
        assert_eq!(Classifier::lifecycle_of("⏰#N5 (♥)"), Lifecycle::Provisional);
        assert_eq!(Classifier::lifecycle_of("  ⏰ #N5 ✅"), Lifecycle::Provisional);
        assert_eq!(Classifier::lifecycle_of("#N5 ✅ (♥)"), Lifecycle::Finalized);
        assert_eq!(Classifier::lifecycle_of("🔰 #N5 (♥)"), Lifecycle::Finalized);
        assert_eq!(Classifier::lifecycle_of("#N5 (♥)"), Lifecycle::Plain);
    }

    #[test]
    fn classify_discards_noise() {
        let c = Classifier::new();
        assert!(c.classify("hello world").is_none());
        let event = c.classify("#N41 ✅ 5(♣ 9♦)").unwrap();
        assert_eq!(event.number, n(41));
        assert_eq!(event.lifecycle, Lifecycle::Finalized);
        assert_eq!(event.markers.len(), 2);
    }
}
