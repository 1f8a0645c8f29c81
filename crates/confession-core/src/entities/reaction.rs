//! Reaction emoji and aggregated per-emoji counts

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::DomainError;

/// The fixed set of reaction emoji
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emoji {
    Heart,
    Laugh,
    Wow,
    Sad,
    Fire,
}

impl Emoji {
    /// Every emoji, in display order
    pub const ALL: [Emoji; 5] = [Self::Heart, Self::Laugh, Self::Wow, Self::Sad, Self::Fire];

    /// The symbol shown to viewers and carried on the wire
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Heart => "❤️",
            Self::Laugh => "😂",
            Self::Wow => "😮",
            Self::Sad => "😢",
            Self::Fire => "🔥",
        }
    }

    /// Look up an emoji by its symbol
    pub fn from_symbol(symbol: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|e| e.symbol() == symbol)
            .ok_or_else(|| DomainError::UnknownEmoji(symbol.to_string()))
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Emoji {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl Serialize for Emoji {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Emoji {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let symbol = String::deserialize(deserializer)?;
        Self::from_symbol(&symbol).map_err(serde::de::Error::custom)
    }
}

/// Aggregated reaction count for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionCount {
    pub emoji: Emoji,
    pub count: u64,
}

impl ReactionCount {
    /// Create a new ReactionCount
    pub fn new(emoji: Emoji, count: u64) -> Self {
        Self { emoji, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        for emoji in Emoji::ALL {
            assert_eq!(Emoji::from_symbol(emoji.symbol()).unwrap(), emoji);
        }
    }

    #[test]
    fn test_unknown_symbol() {
        let err = Emoji::from_symbol("👽").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_EMOJI");
    }

    #[test]
    fn test_serde_uses_symbol() {
        let json = serde_json::to_string(&Emoji::Fire).unwrap();
        assert_eq!(json, "\"🔥\"");

        let parsed: Emoji = serde_json::from_str("\"😂\"").unwrap();
        assert_eq!(parsed, Emoji::Laugh);

        assert!(serde_json::from_str::<Emoji>("\"👽\"").is_err());
    }

    #[test]
    fn test_reaction_count() {
        let count = ReactionCount::new(Emoji::Heart, 5);
        assert_eq!(count.emoji, Emoji::Heart);
        assert_eq!(count.count, 5);
    }
}
