//! The Codenames game: dealing words, the board, team formation, the turn engine
//! and the statistics kept for every player.
//!
//! Nothing in here talks to Discord directly. A running game only sees a
//! [`io::GameChannel`], which the Discord adapter in
//! [`crate::commands`] implements over serenity and which the tests implement
//! with a scripted inbox.

use std::fmt;

pub mod artifacts;
pub mod board;
pub mod election;
pub mod engine;
mod error;
pub mod io;
pub mod lobby;
pub mod messages;
pub mod render;
pub mod session;
pub mod stats;
pub mod words;

pub use error::{Error, Result};

/// One of the two sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Red, Team::Blue];

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Team::Red => "Red 🟥",
            Team::Blue => "Blue 🟦",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A player, identified by their Discord user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl PlayerId {
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    /// The chat mention for this player.
    #[must_use]
    pub fn mention(self) -> String { format!("<@{}>", self.0) }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Normalizes a word the same way for dictionaries and for guesses: trimmed,
/// lowercase, with `ё` spelled as `е`.
#[must_use]
pub fn normalize(word: &str) -> String { word.trim().to_lowercase().replace('ё', "е") }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_case_and_yo() {
        assert_eq!(normalize("  Ёлка "), "елка");
        assert_eq!(normalize("SPY"), "spy");
    }

    #[test]
    fn teams_alternate() {
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::Blue.other().other(), Team::Blue);
    }
}
