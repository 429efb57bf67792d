//! The boundary between a running game and the chat platform.
//!
//! A game reads player messages through [`GameChannel::next_message`], asks for
//! reaction votes with [`GameChannel::poll`] and posts with [`GameChannel::send`].

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use super::{normalize, PlayerId, Team};

/// Where a message was posted or should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    /// The channel the game is played in.
    Room,
    /// A private conversation with one player.
    Direct(PlayerId),
}

/// A message a player wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub place:     Place,
    pub author:    PlayerId,
    pub content:   String,
    /// Platform id of the message, used to react to it.
    pub reference: Option<u64>,
}

impl Incoming {
    pub fn new(place: Place, author: PlayerId, content: impl Into<String>) -> Self {
        Self {
            place,
            author,
            content: content.into(),
            reference: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Pattern(Regex),
    Exact(String),
    /// Matches if the normalized content is one of the words.
    OneOf(HashSet<String>),
}

impl Matcher {
    pub fn matches(&self, content: &str) -> bool {
        match self {
            Matcher::Pattern(pattern) => pattern.is_match(content.trim()),
            Matcher::Exact(expected) => content.trim() == expected,
            Matcher::OneOf(words) => words.contains(&normalize(content)),
        }
    }
}

/// Accepts messages from one place, optionally only from some authors and only
/// with some content.
#[derive(Debug, Clone)]
pub struct Filter {
    place:   Place,
    authors: Option<HashSet<PlayerId>>,
    matcher: Option<Matcher>,
}

impl Filter {
    pub fn new(place: Place) -> Self {
        Self {
            place,
            authors: None,
            matcher: None,
        }
    }

    #[must_use]
    pub fn by_authors(mut self, authors: impl IntoIterator<Item = PlayerId>) -> Self {
        self.authors = Some(authors.into_iter().collect());
        self
    }

    #[must_use]
    pub fn matching(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn place(&self) -> Place { self.place }

    pub fn accepts(&self, incoming: &Incoming) -> bool {
        incoming.place == self.place
            && self
                .authors
                .as_ref()
                .map_or(true, |authors| authors.contains(&incoming.author))
            && self
                .matcher
                .as_ref()
                .map_or(true, |matcher| matcher.matches(&incoming.content))
    }
}

/// Colour of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Red,
    Blue,
    White,
    Black,
}

impl From<Team> for Tone {
    fn from(team: Team) -> Self {
        match team {
            Team::Red => Tone::Red,
            Team::Blue => Tone::Blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes:    Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// A message the game posts: a titled notice, an image or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub title:       Option<String>,
    pub description: Option<String>,
    pub tone:        Tone,
    pub attachment:  Option<Attachment>,
}

impl Outgoing {
    pub fn notice(title: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
            tone,
            attachment: None,
        }
    }

    pub fn image(attachment: Attachment) -> Self {
        Self {
            title:       None,
            description: None,
            tone:        Tone::Neutral,
            attachment:  Some(attachment),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn title_is(&self, title: &str) -> bool { self.title.as_deref() == Some(title) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOption {
    pub emoji: String,
    pub label: String,
}

impl PollOption {
    pub fn new(emoji: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            label: label.into(),
        }
    }
}

/// A reaction vote posted in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub title:       String,
    pub description: String,
    pub tone:        Tone,
    pub options:     Vec<PollOption>,
    /// Only these players' reactions count.
    pub voters:      HashSet<PlayerId>,
}

impl Poll {
    /// Counts distinct eligible voters per option. A voter can back several options.
    pub fn tally(&self, ballots: &[Ballot]) -> Vec<usize> {
        let mut counted = HashSet::new();
        let mut counts = vec![0; self.options.len()];
        for ballot in ballots {
            if ballot.option < counts.len()
                && self.voters.contains(&ballot.voter)
                && counted.insert((ballot.voter, ballot.option))
            {
                counts[ballot.option] += 1;
            }
        }
        counts
    }
}

/// One player's reaction to one poll option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ballot {
    pub voter:  PlayerId,
    pub option: usize,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0} doesn't accept direct messages")]
    DirectMessagesClosed(PlayerId),

    #[error("Couldn't deliver: {0}")]
    Failed(String),
}

#[async_trait]
pub trait GameChannel: Send + Sync {
    /// Waits for the next message that any of `filters` accepts. `None` means no
    /// more input will ever arrive.
    async fn next_message(&self, filters: &[Filter]) -> Option<Incoming>;

    /// Posts `poll`, waits `window` and returns the reactions.
    async fn poll(&self, poll: &Poll, window: Duration) -> Result<Vec<Ballot>, DeliveryError>;

    async fn send(&self, to: Place, message: Outgoing) -> Result<(), DeliveryError>;

    /// Marks a message as seen.
    async fn acknowledge(&self, _incoming: &Incoming) {}
}
