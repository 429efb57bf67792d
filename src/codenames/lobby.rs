//! Signing players up for a game and splitting them into two teams.

use rand::{seq::SliceRandom, Rng};

use super::{Error, PlayerId, Result, Team};

pub const MIN_TEAM_SIZE: usize = 2;
pub const MAX_TEAM_SIZE: usize = 25;

/// Where a player signed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Team(Team),
    /// The player will be put on whichever team is smaller.
    Undecided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyState {
    Open,
    /// The host asked to start; the teams are being balanced.
    Locked,
    CaptainSelection,
    Ready,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Lobby {
    host:       PlayerId,
    state:      LobbyState,
    red:        Vec<PlayerId>,
    blue:       Vec<PlayerId>,
    undecided:  Vec<PlayerId>,
    dictionary: String,
}

impl Lobby {
    pub fn new(host: PlayerId, dictionary: impl Into<String>) -> Self {
        Self {
            host,
            state: LobbyState::Open,
            red: Vec::new(),
            blue: Vec::new(),
            undecided: Vec::new(),
            dictionary: dictionary.into(),
        }
    }

    pub fn host(&self) -> PlayerId { self.host }

    pub fn state(&self) -> LobbyState { self.state }

    pub fn dictionary(&self) -> &str { &self.dictionary }

    pub fn members(&self, slot: Slot) -> &[PlayerId] {
        match slot {
            Slot::Team(Team::Red) => &self.red,
            Slot::Team(Team::Blue) => &self.blue,
            Slot::Undecided => &self.undecided,
        }
    }

    fn members_mut(&mut self, slot: Slot) -> &mut Vec<PlayerId> {
        match slot {
            Slot::Team(Team::Red) => &mut self.red,
            Slot::Team(Team::Blue) => &mut self.blue,
            Slot::Undecided => &mut self.undecided,
        }
    }

    pub fn slot_of(&self, player: PlayerId) -> Option<Slot> {
        [Slot::Team(Team::Red), Slot::Team(Team::Blue), Slot::Undecided]
            .into_iter()
            .find(|slot| self.members(*slot).contains(&player))
    }

    /// Allows `actor` to manage the lobby if they opened it or hold the host role.
    pub fn ensure_host(&self, actor: PlayerId, holds_host_role: bool) -> Result<()> {
        if actor == self.host || holds_host_role {
            Ok(())
        } else {
            Err(Error::NotHost)
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            LobbyState::Open => Ok(()),
            _ => Err(Error::LobbyClosed),
        }
    }

    /// Puts `player` in `slot`, taking them out of any other slot first.
    pub fn enroll(&mut self, player: PlayerId, slot: Slot) -> Result<()> {
        self.ensure_open()?;
        self.remove(player);
        self.members_mut(slot).push(player);
        Ok(())
    }

    /// Returns whether the player was signed up at all.
    pub fn leave(&mut self, player: PlayerId) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.remove(player))
    }

    fn remove(&mut self, player: PlayerId) -> bool {
        let before = self.red.len() + self.blue.len() + self.undecided.len();
        for members in [&mut self.red, &mut self.blue, &mut self.undecided] {
            members.retain(|p| *p != player);
        }
        before != self.red.len() + self.blue.len() + self.undecided.len()
    }

    pub fn set_dictionary(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.dictionary = name.into();
        Ok(())
    }

    /// Closes sign-ups and balances the teams. If the teams can't be formed the
    /// lobby opens again, unchanged.
    pub fn lock<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Teams> {
        self.ensure_open()?;
        self.state = LobbyState::Locked;

        match balance(&self.red, &self.blue, &self.undecided, rng) {
            Ok(teams) => {
                self.red = teams.red.clone();
                self.blue = teams.blue.clone();
                self.undecided.clear();
                self.state = LobbyState::CaptainSelection;
                Ok(teams)
            }
            Err(e) => {
                self.state = LobbyState::Open;
                Err(e)
            }
        }
    }

    pub fn mark_ready(&mut self) -> Result<()> {
        match self.state {
            LobbyState::CaptainSelection => {
                self.state = LobbyState::Ready;
                Ok(())
            }
            _ => Err(Error::LobbyClosed),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            LobbyState::Open | LobbyState::Locked => {
                self.state = LobbyState::Cancelled;
                Ok(())
            }
            _ => Err(Error::LobbyClosed),
        }
    }
}

/// Final team line-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teams {
    pub red:  Vec<PlayerId>,
    pub blue: Vec<PlayerId>,
}

impl Teams {
    pub fn get(&self, team: Team) -> &[PlayerId] {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = PlayerId> + '_ { self.red.iter().chain(&self.blue).copied() }
}

/// Shuffles the undecided players and deals each one to the smaller team, red
/// on a tie, then checks both teams' sizes.
pub fn balance<R: Rng + ?Sized>(
    red: &[PlayerId],
    blue: &[PlayerId],
    undecided: &[PlayerId],
    rng: &mut R,
) -> Result<Teams> {
    let mut red = red.to_vec();
    let mut blue = blue.to_vec();
    let mut undecided = undecided.to_vec();
    undecided.shuffle(rng);

    for player in undecided {
        if red.len() <= blue.len() {
            red.push(player);
        } else {
            blue.push(player);
        }
    }

    if red.len() < MIN_TEAM_SIZE || blue.len() < MIN_TEAM_SIZE {
        return Err(Error::NotEnoughPlayers { min: MIN_TEAM_SIZE });
    }
    if red.len() > MAX_TEAM_SIZE || blue.len() > MAX_TEAM_SIZE {
        return Err(Error::TooManyPlayers { max: MAX_TEAM_SIZE });
    }

    Ok(Teams { red, blue })
}
