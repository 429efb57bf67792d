//! Running a game from captain elections to the final board.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    artifacts::{ArtifactStore, SessionArtifacts},
    board::{Board, Category},
    election::{self, Roster},
    engine::{Clue, Command, Guess, Next, Outcome, TurnEngine},
    io::{Attachment, DeliveryError, GameChannel, Outgoing, Place, Poll, PollOption, Tone},
    lobby::{Teams, MIN_TEAM_SIZE},
    messages,
    render::BoardRenderer,
    stats::StatsStore,
    words::{Dictionary, WordBank},
    Error, PlayerId, Result, Team,
};

pub const DEFAULT_VOTE_WINDOW: Duration = Duration::from_secs(15);

/// Everything a game needs besides its channel.
#[derive(Clone)]
pub struct GameServices {
    pub words:       WordBank,
    pub renderer:    Arc<BoardRenderer>,
    pub artifacts:   ArtifactStore,
    pub stats:       StatsStore,
    pub vote_window: Duration,
}

/// Registers the players, elects both captains and announces the teams.
pub async fn form_teams<R: Rng + Send + ?Sized>(
    channel: &dyn GameChannel,
    services: &GameServices,
    teams: &Teams,
    rng: &mut R,
) -> Result<(Roster, Roster)> {
    let created = services.stats.register_all(teams.all()).await?;
    debug!("Registered {created} new players");

    let mut rosters = Vec::with_capacity(2);
    for team in Team::BOTH {
        let roster = election::elect(channel, team, teams.get(team), services.vote_window, rng)
            .await
            .ok_or(Error::NotEnoughPlayers { min: MIN_TEAM_SIZE })?;
        rosters.push(roster);
    }
    let blue = rosters.pop().ok_or(Error::NotEnoughPlayers { min: MIN_TEAM_SIZE })?;
    let red = rosters.pop().ok_or(Error::NotEnoughPlayers { min: MIN_TEAM_SIZE })?;

    let mut announcements = vec![
        Outgoing::notice(messages::START_ANNOUNCEMENT, Tone::Neutral)
            .description(messages::START_ANNOUNCEMENT_DESCRIPTION),
    ];
    for roster in [&red, &blue] {
        announcements.push(
            Outgoing::notice(messages::team_roster_title(roster.team), Tone::from(roster.team))
                .description(messages::team_roster(roster.captain, &roster.operatives)),
        );
    }
    for announcement in announcements {
        if let Err(e) = channel.send(Place::Room, announcement).await {
            warn!("Couldn't announce the teams: {e}");
        }
    }

    Ok((red, blue))
}

/// Deals a board from `dictionary` and plays it to the end.
pub async fn play<R: Rng + Send + ?Sized>(
    channel: Arc<dyn GameChannel>,
    services: &GameServices,
    red: Roster,
    blue: Roster,
    dictionary: &Dictionary,
    rng: &mut R,
) -> Result<Outcome> {
    let words = dictionary.deal(rng);
    debug!(
        "Dealt from \"{}\": red {:?}, blue {:?}, endgame \"{}\", neutral {:?}",
        dictionary.name(),
        words.red,
        words.blue,
        words.endgame,
        words.neutral
    );
    let board = Board::new(words, rng);
    let engine = TurnEngine::new(board, red, blue);
    Session::start(channel, services, engine).await?.run().await
}

enum TurnEnd {
    /// The operatives typed `0`.
    Passed,
    /// A miss or the last guess of the clue.
    Ended,
    GameOver(Outcome),
}

/// One game being played.
pub struct Session {
    id:          Uuid,
    channel:     Arc<dyn GameChannel>,
    renderer:    Arc<BoardRenderer>,
    stats:       StatsStore,
    artifacts:   SessionArtifacts,
    vote_window: Duration,
    engine:      TurnEngine,
}

impl Session {
    pub async fn start(channel: Arc<dyn GameChannel>, services: &GameServices, engine: TurnEngine) -> Result<Self> {
        let id = Uuid::new_v4();
        let artifacts = services.artifacts.session(id).await?;
        Ok(Self {
            id,
            channel,
            renderer: services.renderer.clone(),
            stats: services.stats.clone(),
            artifacts,
            vote_window: services.vote_window,
            engine,
        })
    }

    pub fn id(&self) -> Uuid { self.id }

    /// Plays until someone wins, the players vote to stop, or input runs out.
    /// The starting board is posted and the images deleted however it ends.
    pub async fn run(mut self) -> Result<Outcome> {
        info!("Game {} started", self.id);
        let result = self.play_turns().await;
        match &result {
            Ok(outcome) => info!("Game {} finished: {outcome:?}", self.id),
            Err(e) => error!("Game {} ended early: {e}", self.id),
        }

        match self.artifacts.initial().await {
            Ok(bytes) => {
                let notice = Outgoing::notice(messages::INITIAL_BOARD, Tone::Neutral)
                    .attach(Attachment::new(messages::INITIAL_BOARD_FILE, bytes));
                self.say(notice).await;
            }
            Err(e) => warn!("Game {} has no starting board to show: {e}", self.id),
        }
        if let Err(e) = self.artifacts.discard().await {
            warn!("Couldn't delete the board images of game {}: {e}", self.id);
        }

        result
    }

    async fn play_turns(&mut self) -> Result<Outcome> {
        self.refresh().await?;
        self.artifacts.freeze_initial().await?;

        let mut captains_need_board = true;
        loop {
            self.broadcast(captains_need_board).await?;
            self.wait_for_clue().await?;
            match self.guesses().await? {
                TurnEnd::Passed => captains_need_board = false,
                TurnEnd::Ended => captains_need_board = true,
                TurnEnd::GameOver(outcome) => return Ok(outcome),
            }
        }
    }

    /// Renders the board and replaces the stored images.
    async fn refresh(&self) -> Result<()> {
        let renderer = self.renderer.clone();
        let board = self.engine.board().clone();
        let (captain, player) = tokio::task::spawn_blocking(move || {
            let rendered = renderer.render(&board);
            Ok::<_, Error>((rendered.captain_png()?, rendered.player_png()?))
        })
        .await??;
        self.artifacts.store(&captain, &player).await
    }

    /// Posts the players' board, and the captains' board to both captains if asked.
    async fn broadcast(&self, to_captains: bool) -> Result<()> {
        if to_captains {
            let captain_board = self.artifacts.captain().await?;
            for captain in [self.engine.active().captain, self.engine.waiting().captain] {
                let image = Attachment::new(messages::CAPTAIN_BOARD_FILE, captain_board.clone());
                self.tell(captain, Outgoing::image(image)).await;
            }
        }
        let player_board = self.artifacts.player().await?;
        self.say(Outgoing::image(Attachment::new(messages::PLAYER_BOARD_FILE, player_board)))
            .await;
        Ok(())
    }

    async fn wait_for_clue(&mut self) -> Result<()> {
        let team = self.engine.active().team;
        let captain = self.engine.active().captain;
        let tone = Tone::from(team);

        self.say(
            Outgoing::notice(messages::waiting_title(team), tone).description(messages::waiting_for_captain(captain)),
        )
        .await;
        self.tell(
            captain,
            Outgoing::notice(messages::CLUE_REQUEST_TITLE, tone).description(messages::CLUE_REQUEST),
        )
        .await;

        let filters = [self.engine.clue_filter()];
        let clue = loop {
            let incoming = self.channel.next_message(&filters).await.ok_or(Error::Abandoned)?;
            let Some(clue) = Clue::parse(&incoming.content) else { continue };
            match self.engine.give_clue(incoming.author, clue.clone()) {
                Ok(()) => break clue,
                Err(e) => debug!("Ignoring clue \"{clue}\": {e}"),
            }
        };
        debug!("Game {}: {team} clue is \"{clue}\"", self.id);

        self.tell(captain, Outgoing::notice(messages::CLUE_ACCEPTED, tone)).await;
        self.say(
            Outgoing::notice(messages::clue_given_title(team), tone)
                .description(messages::clue_given(captain, &clue.to_string())),
        )
        .await;
        self.say(
            Outgoing::notice(messages::waiting_title(team), tone).description(messages::waiting_for_operatives(team)),
        )
        .await;
        Ok(())
    }

    async fn guesses(&mut self) -> Result<TurnEnd> {
        loop {
            let filters = self.engine.guess_filters();
            let incoming = self.channel.next_message(&filters).await.ok_or(Error::Abandoned)?;

            match Command::parse(&incoming.content) {
                Command::RequestStop => {
                    if self.stop_vote(incoming.author).await {
                        return Ok(TurnEnd::GameOver(self.engine.stop()));
                    }
                }
                Command::EndTurn => match self.engine.end_turn(incoming.author) {
                    Ok(()) => {
                        self.channel.acknowledge(&incoming).await;
                        return Ok(TurnEnd::Passed);
                    }
                    Err(e) => debug!("Ignoring end of turn: {e}"),
                },
                Command::OpenWord(word) => {
                    let guess = match self.engine.guess(incoming.author, &word) {
                        Ok(guess) => guess,
                        Err(e) if e.is_recoverable() => {
                            debug!("Ignoring guess \"{word}\": {e}");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    self.refresh().await?;
                    self.report(&guess).await;

                    match guess.next {
                        Next::Continue => self.broadcast(true).await?,
                        Next::TurnOver => return Ok(TurnEnd::Ended),
                        Next::GameOver(outcome) => {
                            self.conclude(outcome).await;
                            return Ok(TurnEnd::GameOver(outcome));
                        }
                    }
                }
            }
        }
    }

    /// Tells the room and both captains what the guessed word was.
    async fn report(&self, guess: &Guess) {
        use messages::*;

        let team = guess.guesser;
        let word = guess.word.as_str();
        let (room, own, opponent) = match guess.category {
            Category::Team(owner) if owner == team => {
                let tone = Tone::from(team);
                (
                    Outgoing::notice(SUCCESS_TITLE, tone).description(SUCCESS_ROOM),
                    Outgoing::notice(SUCCESS_TITLE, tone).description(own_word_opened(word)),
                    Outgoing::notice(OPPONENT_SUCCESS_TITLE, tone).description(opponents_opened_their_word(word)),
                )
            }
            Category::Team(owner) => {
                let tone = Tone::from(owner);
                (
                    Outgoing::notice(MISS_TITLE, tone).description(MISS_OPPONENT_ROOM),
                    Outgoing::notice(MISS_TITLE, tone).description(opened_opponent_word(word)),
                    Outgoing::notice(LUCKY_TITLE, tone).description(opponents_opened_your_word(word)),
                )
            }
            Category::Neutral => (
                Outgoing::notice(MISS_TITLE, Tone::White).description(MISS_NEUTRAL_ROOM),
                Outgoing::notice(MISS_TITLE, Tone::White).description(opened_neutral_word(word)),
                Outgoing::notice(OPPONENT_MISS_TITLE, Tone::White).description(opponents_opened_neutral_word(word)),
            ),
            Category::Endgame => (
                Outgoing::notice(MISS_TITLE, Tone::Black).description(MISS_ENDGAME_ROOM),
                Outgoing::notice(MISS_TITLE, Tone::Black).description(opened_endgame_word(word)),
                Outgoing::notice(LUCKY_TITLE, Tone::Black).description(opponents_opened_endgame_word(word)),
            ),
        };

        self.say(room).await;
        self.tell(self.engine.roster(team).captain, own).await;
        self.tell(self.engine.roster(team.other()).captain, opponent).await;
    }

    /// Shows the final board, tells everyone how it went and records the result. A
    /// board that can't be shown doesn't cost anyone their statistics.
    async fn conclude(&self, outcome: Outcome) {
        let (winner, description) = match outcome {
            Outcome::WonByAllWords(team) => (team, messages::won_by_all_words(team)),
            Outcome::WonByEndgame(team) => (team, messages::won_by_endgame(team)),
            Outcome::StoppedByVote => return,
        };

        if let Err(e) = self.broadcast(true).await {
            warn!("Game {} couldn't show the final board: {e}", self.id);
        }
        self.say(Outgoing::notice(messages::GAME_OVER_TITLE, Tone::from(winner)).description(description))
            .await;

        let Some(result) = self.engine.result() else {
            return;
        };
        for player in result.winners.members() {
            let notice = Outgoing::notice(messages::TEAM_WON_TITLE, Tone::from(winner)).description(messages::TEAM_WON);
            self.tell(player, notice).await;
        }
        for player in result.losers.members() {
            let notice =
                Outgoing::notice(messages::TEAM_LOST_TITLE, Tone::from(winner.other())).description(messages::TEAM_LOST);
            self.tell(player, notice).await;
        }

        if let Err(e) = self.stats.record_game(&result).await {
            error!("Couldn't record the result of game {}: {e}", self.id);
        }
    }

    /// Asks every player whether to stop. More yes than no votes stops the game.
    async fn stop_vote(&self, requested_by: PlayerId) -> bool {
        info!("Game {}: {requested_by} asked to stop", self.id);
        let poll = Poll {
            title:       messages::STOP_VOTE_TITLE.to_string(),
            description: messages::stop_vote(self.vote_window),
            tone:        Tone::Neutral,
            options:     vec![PollOption::new("👍", messages::YES), PollOption::new("👎", messages::NO)],
            voters:      self.engine.players().collect(),
        };

        let counts = match self.channel.poll(&poll, self.vote_window).await {
            Ok(ballots) => poll.tally(&ballots),
            Err(e) => {
                warn!("Couldn't run the stop vote, continuing: {e}");
                return false;
            }
        };
        let yes = counts.first().copied().unwrap_or(0);
        let no = counts.get(1).copied().unwrap_or(0);
        let stop = yes > no;
        debug!("Game {}: stop vote {yes} yes, {no} no", self.id);

        let verdict = if stop { messages::GAME_STOPPED } else { messages::GAME_CONTINUED };
        self.say(Outgoing::notice(messages::STOP_VOTE_TITLE, Tone::Neutral).description(verdict))
            .await;
        stop
    }

    async fn say(&self, message: Outgoing) {
        if let Err(e) = self.channel.send(Place::Room, message).await {
            warn!("Game {}: couldn't post to the room: {e}", self.id);
        }
    }

    /// Sends a private message, asking the player in the room to open their DMs if it bounces.
    async fn tell(&self, player: PlayerId, message: Outgoing) {
        match self.channel.send(Place::Direct(player), message).await {
            Ok(()) => {}
            Err(DeliveryError::DirectMessagesClosed(player)) => {
                let notice = Outgoing::notice(messages::DIRECT_MESSAGES_CLOSED_TITLE, Tone::Neutral)
                    .description(messages::direct_messages_closed(player));
                self.say(notice).await;
            }
            Err(e) => warn!("Game {}: couldn't message {player}: {e}", self.id),
        }
    }
}
