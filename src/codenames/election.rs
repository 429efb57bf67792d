//! Choosing each team's captain with a reaction vote.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use tracing::{info, warn};

use super::{
    io::{GameChannel, Outgoing, Place, Poll, PollOption, Tone},
    messages, PlayerId, Team,
};

/// Letters used to label candidates. `R` is kept for the "random captain" option.
pub const CANDIDATE_LETTERS: &str = "ABCDEFGHIJKLMNOPQSTUVWXYZ";
pub const RANDOM_EMOJI: &str = "🇷";

/// A team once its captain is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub team:       Team,
    pub captain:    PlayerId,
    pub operatives: Vec<PlayerId>,
}

impl Roster {
    /// Makes `captain` the captain and everyone else in `members` an operative.
    pub fn new(team: Team, members: &[PlayerId], captain: PlayerId) -> Self {
        Self {
            team,
            captain,
            operatives: members.iter().copied().filter(|p| *p != captain).collect(),
        }
    }

    /// The captain first, then the operatives.
    pub fn members(&self) -> impl Iterator<Item = PlayerId> + '_ {
        std::iter::once(self.captain).chain(self.operatives.iter().copied())
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.captain == player || self.is_operative(player)
    }

    pub fn is_operative(&self, player: PlayerId) -> bool { self.operatives.contains(&player) }
}

/// The regional indicator emoji for an ASCII capital letter.
pub fn letter_emoji(letter: char) -> String {
    char::from_u32(0x1F1E6 + (letter as u32 - 'A' as u32))
        .map(String::from)
        .unwrap_or_default()
}

/// Option 0 is the random pick, then one option per member in order.
pub fn captain_poll(team: Team, members: &[PlayerId]) -> Poll {
    let mut options = vec![PollOption::new(RANDOM_EMOJI, messages::RANDOM_CAPTAIN)];
    options.extend(
        members
            .iter()
            .zip(CANDIDATE_LETTERS.chars())
            .map(|(player, letter)| PollOption::new(letter_emoji(letter), player.mention())),
    );

    Poll {
        title: messages::captain_election_title(team),
        description: messages::CAPTAIN_ELECTION_DESCRIPTION.to_string(),
        tone: Tone::from(team),
        options,
        voters: members.iter().copied().collect(),
    }
}

/// Picks the captain from a poll tally. `counts[0]` is the random option,
/// `counts[i + 1]` belongs to `members[i]`.
///
/// If the random option has at least as many votes as the best candidate, the
/// captain is any member at random. Otherwise it's one of the candidates with
/// the most votes.
pub fn decide<R: Rng + ?Sized>(members: &[PlayerId], counts: &[usize], rng: &mut R) -> Option<PlayerId> {
    let random = counts.first().copied().unwrap_or(0);
    let candidates = counts.get(1..).unwrap_or_default();
    let best = candidates.iter().copied().max().unwrap_or(0);

    if random >= best {
        return members.choose(rng).copied();
    }

    let leaders = members
        .iter()
        .zip(candidates)
        .filter(|(_, votes)| **votes == best)
        .map(|(player, _)| *player)
        .collect::<Vec<_>>();
    leaders.choose(rng).copied()
}

/// Runs the captain vote for one team and announces the result.
///
/// A poll that can't be posted counts as nobody voting, which means a random captain.
pub async fn elect<R: Rng + Send + ?Sized>(
    channel: &dyn GameChannel,
    team: Team,
    members: &[PlayerId],
    window: Duration,
    rng: &mut R,
) -> Option<Roster> {
    let poll = captain_poll(team, members);
    let counts = match channel.poll(&poll, window).await {
        Ok(ballots) => poll.tally(&ballots),
        Err(e) => {
            warn!("Couldn't run the {team} captain vote, picking at random: {e}");
            vec![0; poll.options.len()]
        }
    };

    let captain = decide(members, &counts, rng)?;
    info!("{team} captain is {captain}");

    let notice = Outgoing::notice(messages::captain_elected_title(team), Tone::from(team))
        .description(messages::captain_elected(captain));
    if let Err(e) = channel.send(Place::Room, notice).await {
        warn!("Couldn't announce the {team} captain: {e}");
    }

    Some(Roster::new(team, members, captain))
}
