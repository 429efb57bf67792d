//! Word dictionaries and dealing the 25 words of a game.

use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use rand::{seq::SliceRandom, Rng};
use tokio::fs;
use tracing::debug;

use super::{normalize, Error, Result, Team};

pub const BOARD_SIZE: usize = 25;
pub const FIRST_TEAM_WORD_COUNT: usize = 9;
pub const SECOND_TEAM_WORD_COUNT: usize = 8;
pub const NEUTRAL_WORD_COUNT: usize = BOARD_SIZE - 1 - FIRST_TEAM_WORD_COUNT - SECOND_TEAM_WORD_COUNT;

/// A directory of newline separated dictionaries, one `<name>.txt` per dictionary.
#[derive(Debug, Clone)]
pub struct WordBank {
    directory: PathBuf,
}

impl WordBank {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path { &self.directory }

    /// Reads and validates the dictionary called `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::DictionaryNotFound`] if there's no such file or it has no words
    /// - [`Error::InsufficientWords`] if it has fewer than [`BOARD_SIZE`] distinct words
    /// - [`Error::Io`] if the file exists but can't be read
    pub async fn load(&self, name: &str) -> Result<Dictionary> {
        // Dictionary names come from user input, keep them inside the directory.
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(Error::DictionaryNotFound(name.to_string()));
        }

        let path = self.directory.join(format!("{name}.txt"));
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::DictionaryNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let dictionary = Dictionary::parse(name, &text)?;
        debug!(
            "Loaded dictionary \"{name}\" ({} words) from \"{}\"",
            dictionary.len(),
            path.display()
        );
        Ok(dictionary)
    }
}

/// A validated list of distinct, normalized words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    name:  String,
    words: Vec<String>,
}

impl Dictionary {
    /// Parses a newline separated word list. Blank lines and repeated words are dropped.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        let words = text
            .lines()
            .map(normalize)
            .filter(|word| !word.is_empty() && seen.insert(word.clone()))
            .collect::<Vec<_>>();

        if words.is_empty() {
            return Err(Error::DictionaryNotFound(name));
        }
        if words.len() < BOARD_SIZE {
            return Err(Error::InsufficientWords {
                dictionary: name,
                found:      words.len(),
                needed:     BOARD_SIZE,
            });
        }

        Ok(Self { name, words })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn words(&self) -> &[String] { &self.words }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    /// Deals the words of one game.
    ///
    /// The sampling order is fixed: 25 distinct words, then the endgame word out of
    /// those, then a coin flip for which team gets nine words, then the nine, then
    /// the eight. Whatever is left is neutral.
    pub fn deal<R: Rng + ?Sized>(&self, rng: &mut R) -> GameWords {
        let mut pool = self
            .words
            .choose_multiple(rng, BOARD_SIZE)
            .cloned()
            .collect::<Vec<_>>();

        let endgame = pool.swap_remove(rng.gen_range(0..pool.len()));
        let nine_to_red = rng.gen_bool(0.5);
        let first = take(&mut pool, FIRST_TEAM_WORD_COUNT, rng);
        let second = take(&mut pool, SECOND_TEAM_WORD_COUNT, rng);
        let (red, blue) = if nine_to_red { (first, second) } else { (second, first) };

        GameWords {
            red,
            blue,
            endgame,
            neutral: pool,
        }
    }
}

/// Removes `count` random words from `pool` and returns them.
fn take<R: Rng + ?Sized>(pool: &mut Vec<String>, count: usize, rng: &mut R) -> Vec<String> {
    let picked = pool.partial_shuffle(rng, count).0.to_vec();
    pool.retain(|word| !picked.contains(word));
    picked
}

/// The partition of a game's 25 words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameWords {
    pub red:     Vec<String>,
    pub blue:    Vec<String>,
    pub endgame: String,
    pub neutral: Vec<String>,
}

impl GameWords {
    pub fn team(&self, team: Team) -> &[String] {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    /// The team that moves first, which is always the one holding more words.
    pub fn first_team(&self) -> Team {
        if self.red.len() > self.blue.len() {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// Every dealt word: red, blue, the endgame word, then neutral.
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.red
            .iter()
            .chain(self.blue.iter())
            .chain(std::iter::once(&self.endgame))
            .chain(self.neutral.iter())
    }
}
