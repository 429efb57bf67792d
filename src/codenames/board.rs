use rand::{seq::SliceRandom, Rng};

use super::{normalize, words::GameWords, Error, Result, Team};

/// What a word turns out to be once it's opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Team(Team),
    Neutral,
    Endgame,
}

/// A word as it appears on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card<'a> {
    pub word:     &'a str,
    pub category: Category,
    pub opened:   bool,
}

/// The 25 words of a game, the order they're drawn in and which ones are open.
///
/// Words are only ever added to the opened list, and only once.
#[derive(Debug, Clone)]
pub struct Board {
    words:  GameWords,
    layout: Vec<String>,
    opened: Vec<String>,
}

impl Board {
    /// Shuffles the dealt words into the display order, which then stays fixed.
    pub fn new<R: Rng + ?Sized>(words: GameWords, rng: &mut R) -> Self {
        let mut layout = words.all().cloned().collect::<Vec<_>>();
        layout.shuffle(rng);
        Self {
            words,
            layout,
            opened: Vec::new(),
        }
    }

    pub fn words(&self) -> &GameWords { &self.words }

    pub fn layout(&self) -> &[String] { &self.layout }

    /// Opened words, in the order they were opened.
    pub fn opened(&self) -> &[String] { &self.opened }

    pub fn category(&self, word: &str) -> Option<Category> {
        let word = normalize(word);
        if self.words.red.contains(&word) {
            Some(Category::Team(Team::Red))
        } else if self.words.blue.contains(&word) {
            Some(Category::Team(Team::Blue))
        } else if self.words.endgame == word {
            Some(Category::Endgame)
        } else if self.words.neutral.contains(&word) {
            Some(Category::Neutral)
        } else {
            None
        }
    }

    pub fn is_opened(&self, word: &str) -> bool { self.opened.contains(&normalize(word)) }

    /// Words that are on the board and not yet opened.
    pub fn available(&self) -> impl Iterator<Item = &String> {
        self.layout.iter().filter(|word| !self.opened.contains(word))
    }

    /// Opens `word` and reports what it was.
    pub fn open(&mut self, word: &str) -> Result<Category> {
        let word = normalize(word);
        let category = self
            .category(&word)
            .ok_or_else(|| Error::WordNotInGame(word.clone()))?;
        if self.opened.contains(&word) {
            return Err(Error::AlreadyOpened(word));
        }
        self.opened.push(word);
        Ok(category)
    }

    /// How many of `team`'s words are still closed.
    pub fn remaining(&self, team: Team) -> usize {
        self.words
            .team(team)
            .iter()
            .filter(|word| !self.opened.contains(word))
            .count()
    }

    pub fn cleared(&self, team: Team) -> bool { self.remaining(team) == 0 }

    /// Every card in display order.
    pub fn cards(&self) -> impl Iterator<Item = Card<'_>> {
        self.layout.iter().filter_map(|word| {
            Some(Card {
                word:     word.as_str(),
                category: self.category(word)?,
                opened:   self.opened.contains(word),
            })
        })
    }
}
