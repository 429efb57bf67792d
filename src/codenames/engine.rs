//! The rules of a game in progress, without any I/O.

use std::{fmt, mem};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    board::{Board, Category},
    election::Roster,
    io::{Filter, Matcher, Place},
    normalize,
    stats::GameResult,
    Error, PlayerId, Result, Team,
};

/// A clue is one word followed by a number, like `meow 3`.
pub static CLUE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+ \d+$").unwrap());

pub const END_TURN: &str = "0";
pub const REQUEST_STOP: &str = "000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    pub word:  String,
    pub count: u32,
}

impl Clue {
    /// Accepts `<word> <number>` with a number above zero.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !CLUE_PATTERN.is_match(text) {
            return None;
        }
        let (word, count) = text.split_once(' ')?;
        let count = count.parse::<u32>().ok().filter(|count| *count > 0)?;
        Some(Self {
            word: word.to_string(),
            count,
        })
    }
}

impl fmt::Display for Clue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.word, self.count) }
}

/// What a message in the room asks for while a team is guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenWord(String),
    EndTurn,
    RequestStop,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            REQUEST_STOP => Command::RequestStop,
            END_TURN => Command::EndTurn,
            word => Command::OpenWord(normalize(word)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WonByAllWords(Team),
    WonByEndgame(Team),
    StoppedByVote,
}

impl Outcome {
    pub const fn winner(self) -> Option<Team> {
        match self {
            Outcome::WonByAllWords(team) | Outcome::WonByEndgame(team) => Some(team),
            Outcome::StoppedByVote => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the team's captain to give a clue.
    ClueWait(Team),
    /// The team's operatives are guessing. Every correct guess uses up one of
    /// `remaining`; a correct guess with nothing remaining ends the turn.
    GuessLoop { team: Team, remaining: u32 },
    Over(Outcome),
}

/// What happens after a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Continue,
    TurnOver,
    GameOver(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub word:     String,
    pub guesser:  Team,
    pub category: Category,
    pub next:     Next,
}

impl Guess {
    pub fn is_hit(&self) -> bool { self.category == Category::Team(self.guesser) }
}

/// The team whose turn it is and the one waiting.
#[derive(Debug, Clone)]
struct Sides {
    active: Roster,
    other:  Roster,
}

impl Sides {
    fn swap(&mut self) { mem::swap(&mut self.active, &mut self.other) }
}

#[derive(Debug, Clone)]
pub struct TurnEngine {
    board: Board,
    sides: Sides,
    phase: Phase,
    clue:  Option<Clue>,
}

impl TurnEngine {
    /// The team holding nine words starts.
    pub fn new(board: Board, red: Roster, blue: Roster) -> Self {
        let first = board.words().first_team();
        let sides = match first {
            Team::Red => Sides {
                active: red,
                other:  blue,
            },
            Team::Blue => Sides {
                active: blue,
                other:  red,
            },
        };
        Self {
            board,
            sides,
            phase: Phase::ClueWait(first),
            clue: None,
        }
    }

    pub fn board(&self) -> &Board { &self.board }

    pub fn phase(&self) -> Phase { self.phase }

    pub fn clue(&self) -> Option<&Clue> { self.clue.as_ref() }

    /// The team whose turn it is, or the one that moved last once the game is over.
    pub fn active(&self) -> &Roster { &self.sides.active }

    pub fn waiting(&self) -> &Roster { &self.sides.other }

    pub fn roster(&self, team: Team) -> &Roster {
        if self.sides.active.team == team {
            &self.sides.active
        } else {
            &self.sides.other
        }
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.sides.active.members().chain(self.sides.other.members())
    }

    pub fn is_player(&self, player: PlayerId) -> bool {
        self.sides.active.contains(player) || self.sides.other.contains(player)
    }

    pub fn is_over(&self) -> bool { matches!(self.phase, Phase::Over(_)) }

    pub fn give_clue(&mut self, author: PlayerId, clue: Clue) -> Result<()> {
        match self.phase {
            Phase::ClueWait(team) if author == self.sides.active.captain => {
                self.phase = Phase::GuessLoop {
                    team,
                    remaining: clue.count,
                };
                self.clue = Some(clue);
                Ok(())
            }
            _ => Err(Error::OutOfTurn(author)),
        }
    }

    /// Opens `word` for the guessing team.
    pub fn guess(&mut self, author: PlayerId, word: &str) -> Result<Guess> {
        let Phase::GuessLoop { team, remaining } = self.phase else {
            return Err(Error::OutOfTurn(author));
        };
        if !self.sides.active.is_operative(author) {
            return Err(Error::OutOfTurn(author));
        }

        let category = self.board.open(word)?;
        let next = match category {
            Category::Team(owner) if owner == team => {
                if self.board.cleared(team) {
                    Next::GameOver(Outcome::WonByAllWords(team))
                } else if remaining > 0 {
                    self.phase = Phase::GuessLoop {
                        team,
                        remaining: remaining - 1,
                    };
                    Next::Continue
                } else {
                    Next::TurnOver
                }
            }
            Category::Team(opponent) => {
                if self.board.cleared(opponent) {
                    Next::GameOver(Outcome::WonByAllWords(opponent))
                } else {
                    Next::TurnOver
                }
            }
            Category::Neutral => Next::TurnOver,
            Category::Endgame => Next::GameOver(Outcome::WonByEndgame(team.other())),
        };

        match next {
            Next::Continue => {}
            Next::TurnOver => self.switch_turn(),
            Next::GameOver(outcome) => self.phase = Phase::Over(outcome),
        }

        Ok(Guess {
            word: normalize(word),
            guesser: team,
            category,
            next,
        })
    }

    /// An operative of the guessing team passes the turn.
    pub fn end_turn(&mut self, author: PlayerId) -> Result<()> {
        match self.phase {
            Phase::GuessLoop { .. } if self.sides.active.is_operative(author) => {
                self.switch_turn();
                Ok(())
            }
            _ => Err(Error::OutOfTurn(author)),
        }
    }

    /// Ends the game after a successful stop vote.
    pub fn stop(&mut self) -> Outcome {
        if let Phase::Over(outcome) = self.phase {
            return outcome;
        }
        self.phase = Phase::Over(Outcome::StoppedByVote);
        Outcome::StoppedByVote
    }

    fn switch_turn(&mut self) {
        self.sides.swap();
        self.clue = None;
        self.phase = Phase::ClueWait(self.sides.active.team);
    }

    /// Who won and lost, once the game ended with a winner.
    pub fn result(&self) -> Option<GameResult> {
        let Phase::Over(outcome) = self.phase else { return None };
        let winner = outcome.winner()?;
        Some(GameResult {
            winners: self.roster(winner).clone(),
            losers:  self.roster(winner.other()).clone(),
        })
    }

    /// Accepts the clue from the active captain's private conversation.
    pub fn clue_filter(&self) -> Filter {
        let captain = self.sides.active.captain;
        Filter::new(Place::Direct(captain))
            .by_authors([captain])
            .matching(Matcher::Pattern(CLUE_PATTERN.clone()))
    }

    /// Accepts closed words and `0` from the guessing operatives, and `000` from anyone playing.
    pub fn guess_filters(&self) -> Vec<Filter> {
        let mut words = self.board.available().cloned().collect::<std::collections::HashSet<_>>();
        words.insert(END_TURN.to_string());

        vec![
            Filter::new(Place::Room)
                .by_authors(self.sides.active.operatives.iter().copied())
                .matching(Matcher::OneOf(words)),
            Filter::new(Place::Room)
                .by_authors(self.players())
                .matching(Matcher::Exact(REQUEST_STOP.to_string())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::codenames::{board::tests::fixed_words, io::Incoming};

    const RED_CAPTAIN: PlayerId = PlayerId(1);
    const RED_OPERATIVE: PlayerId = PlayerId(2);
    const BLUE_CAPTAIN: PlayerId = PlayerId(4);
    const BLUE_OPERATIVE: PlayerId = PlayerId(5);

    fn engine() -> TurnEngine {
        let board = Board::new(fixed_words(), &mut StdRng::seed_from_u64(8));
        TurnEngine::new(
            board,
            Roster::new(Team::Red, &[RED_CAPTAIN, RED_OPERATIVE, PlayerId(3)], RED_CAPTAIN),
            Roster::new(Team::Blue, &[BLUE_CAPTAIN, BLUE_OPERATIVE, PlayerId(6)], BLUE_CAPTAIN),
        )
    }

    fn clue(count: u32) -> Clue {
        Clue {
            word: "spy".to_string(),
            count,
        }
    }

    #[test]
    fn clues_need_a_positive_number() {
        assert_eq!(Clue::parse(" meow 3 "), Some(Clue {
            word:  "meow".to_string(),
            count: 3,
        }));
        assert_eq!(Clue::parse("meow 0"), None);
        assert_eq!(Clue::parse("two words 2"), None);
        assert_eq!(Clue::parse("meow"), None);
        assert_eq!(Clue::parse("meow -1"), None);
    }

    #[test]
    fn stop_is_checked_before_end_turn() {
        assert_eq!(Command::parse("000"), Command::RequestStop);
        assert_eq!(Command::parse(" 0 "), Command::EndTurn);
        assert_eq!(Command::parse("Red1"), Command::OpenWord("red1".to_string()));
    }

    #[test]
    fn team_with_nine_words_starts() {
        let engine = engine();
        assert_eq!(engine.phase(), Phase::ClueWait(Team::Red));
        assert_eq!(engine.active().captain, RED_CAPTAIN);
    }

    #[test]
    fn only_the_active_captain_gives_clues() {
        let mut engine = engine();
        assert!(engine.give_clue(BLUE_CAPTAIN, clue(2)).is_err());
        assert!(engine.give_clue(RED_OPERATIVE, clue(2)).is_err());
        engine.give_clue(RED_CAPTAIN, clue(2)).unwrap();
        assert_eq!(engine.phase(), Phase::GuessLoop {
            team:      Team::Red,
            remaining: 2,
        });
        assert!(engine.give_clue(RED_CAPTAIN, clue(2)).is_err());
    }

    #[test]
    fn a_clue_of_n_allows_n_plus_one_hits() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(1)).unwrap();
        assert_eq!(engine.guess(RED_OPERATIVE, "red1").unwrap().next, Next::Continue);
        let last = engine.guess(RED_OPERATIVE, "red2").unwrap();
        assert!(last.is_hit());
        assert_eq!(last.next, Next::TurnOver);
        assert_eq!(engine.phase(), Phase::ClueWait(Team::Blue));
        assert_eq!(engine.active().captain, BLUE_CAPTAIN);
    }

    #[test]
    fn opponent_word_ends_the_turn_with_budget_left() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(3)).unwrap();
        let guess = engine.guess(RED_OPERATIVE, "blue1").unwrap();
        assert_eq!(guess.category, Category::Team(Team::Blue));
        assert_eq!(guess.next, Next::TurnOver);
        assert_eq!(engine.phase(), Phase::ClueWait(Team::Blue));
    }

    #[test]
    fn neutral_word_ends_the_turn() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(3)).unwrap();
        assert_eq!(engine.guess(RED_OPERATIVE, "plain1").unwrap().next, Next::TurnOver);
    }

    #[test]
    fn endgame_word_hands_the_win_over() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(3)).unwrap();
        let guess = engine.guess(RED_OPERATIVE, "bomb").unwrap();
        assert_eq!(guess.next, Next::GameOver(Outcome::WonByEndgame(Team::Blue)));
        assert!(engine.is_over());

        let result = engine.result().unwrap();
        assert_eq!(result.winners.team, Team::Blue);
        assert_eq!(result.losers.captain, RED_CAPTAIN);
    }

    #[test]
    fn opening_the_opponents_last_word_makes_them_win() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(1)).unwrap();
        engine.guess(RED_OPERATIVE, "red1").unwrap();
        engine.guess(RED_OPERATIVE, "red2").unwrap();

        engine.give_clue(BLUE_CAPTAIN, clue(9)).unwrap();
        for i in 1..=7 {
            assert_eq!(engine.guess(BLUE_OPERATIVE, &format!("blue{i}")).unwrap().next, Next::Continue);
        }
        engine.end_turn(BLUE_OPERATIVE).unwrap();

        engine.give_clue(RED_CAPTAIN, clue(1)).unwrap();
        let guess = engine.guess(RED_OPERATIVE, "blue8").unwrap();
        assert_eq!(guess.next, Next::GameOver(Outcome::WonByAllWords(Team::Blue)));
    }

    #[test]
    fn opening_all_own_words_wins() {
        let mut engine = engine();
        engine.give_clue(RED_CAPTAIN, clue(9)).unwrap();
        for i in 1..=8 {
            assert_eq!(engine.guess(RED_OPERATIVE, &format!("red{i}")).unwrap().next, Next::Continue);
        }
        let last = engine.guess(PlayerId(3), "red9").unwrap();
        assert_eq!(last.next, Next::GameOver(Outcome::WonByAllWords(Team::Red)));
        assert_eq!(engine.result().unwrap().winners.team, Team::Red);
    }

    #[test]
    fn rejected_guesses_change_nothing() {
        let mut engine = engine();
        assert!(matches!(engine.guess(RED_OPERATIVE, "red1"), Err(Error::OutOfTurn(_))));
        engine.give_clue(RED_CAPTAIN, clue(2)).unwrap();
        assert!(matches!(engine.guess(RED_CAPTAIN, "red1"), Err(Error::OutOfTurn(_))));
        assert!(matches!(engine.guess(BLUE_OPERATIVE, "red1"), Err(Error::OutOfTurn(_))));
        assert!(matches!(engine.guess(RED_OPERATIVE, "nothing"), Err(Error::WordNotInGame(_))));
        engine.guess(RED_OPERATIVE, "red1").unwrap();
        assert!(matches!(engine.guess(RED_OPERATIVE, "red1"), Err(Error::AlreadyOpened(_))));
        assert_eq!(engine.phase(), Phase::GuessLoop {
            team:      Team::Red,
            remaining: 1,
        });
    }

    #[test]
    fn stopping_has_no_winner() {
        let mut engine = engine();
        assert_eq!(engine.stop(), Outcome::StoppedByVote);
        assert!(engine.is_over());
        assert!(engine.result().is_none());
    }

    #[test]
    fn filters_follow_the_turn() {
        let mut engine = engine();
        let clue_filter = engine.clue_filter();
        assert!(clue_filter.accepts(&Incoming::new(Place::Direct(RED_CAPTAIN), RED_CAPTAIN, "spy 2")));
        assert!(!clue_filter.accepts(&Incoming::new(Place::Room, RED_CAPTAIN, "spy 2")));
        assert!(!clue_filter.accepts(&Incoming::new(Place::Direct(RED_CAPTAIN), RED_CAPTAIN, "spy")));

        engine.give_clue(RED_CAPTAIN, clue(2)).unwrap();
        engine.guess(RED_OPERATIVE, "red1").unwrap();
        let filters = engine.guess_filters();
        let accepted = |author: PlayerId, content: &str| {
            filters
                .iter()
                .any(|f| f.accepts(&Incoming::new(Place::Room, author, content)))
        };
        assert!(accepted(RED_OPERATIVE, "RED2"));
        assert!(accepted(RED_OPERATIVE, "0"));
        assert!(!accepted(RED_OPERATIVE, "red1"));
        assert!(!accepted(RED_CAPTAIN, "red2"));
        assert!(!accepted(BLUE_OPERATIVE, "0"));
        assert!(accepted(BLUE_OPERATIVE, "000"));
        assert!(!accepted(PlayerId(99), "000"));
    }
}
