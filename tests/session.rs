use std::{
    collections::{HashSet, VecDeque},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use fmhy_bot::codenames::{
    artifacts::ArtifactStore,
    board::Board,
    election::Roster,
    engine::{Outcome, TurnEngine},
    io::{Ballot, DeliveryError, Filter, GameChannel, Incoming, Outgoing, Place, Poll},
    lobby::Teams,
    messages,
    render::{BoardRenderer, Sizing},
    session::{self, GameServices, Session},
    stats::StatsStore,
    words::{GameWords, WordBank},
    Error, PlayerId, Team,
};
use rand::{rngs::StdRng, SeedableRng};
use temp_dir::TempDir;

const RED_CAPTAIN: PlayerId = PlayerId(1);
const RED_OPERATIVE: PlayerId = PlayerId(2);
const BLUE_CAPTAIN: PlayerId = PlayerId(4);
const BLUE_OPERATIVE: PlayerId = PlayerId(5);

/// Replays queued messages and votes, and records everything the game posts.
#[derive(Default)]
struct ScriptedChannel {
    inbox:  Mutex<VecDeque<Incoming>>,
    polls:  Mutex<VecDeque<Vec<Ballot>>>,
    sent:   Mutex<Vec<(Place, Outgoing)>>,
    closed: HashSet<PlayerId>,
    /// Deletes the current board images once the room gets a notice with this title.
    lose_boards_on: Option<(String, PathBuf)>,
}

impl ScriptedChannel {
    fn new() -> Self { Self::default() }

    fn with_closed_direct_messages(player: PlayerId) -> Self {
        Self {
            closed: HashSet::from([player]),
            ..Self::default()
        }
    }

    fn losing_boards_on(title: &str, images: PathBuf) -> Self {
        Self {
            lose_boards_on: Some((title.to_string(), images)),
            ..Self::default()
        }
    }

    fn lose_boards(images: &Path) {
        for entry in std::fs::read_dir(images).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if name.ends_with("-captain.png") || name.ends_with("-player.png") {
                std::fs::remove_file(path).unwrap();
            }
        }
    }

    fn room(&self, author: PlayerId, content: &str) -> &Self {
        self.inbox
            .lock()
            .unwrap()
            .push_back(Incoming::new(Place::Room, author, content));
        self
    }

    fn direct(&self, author: PlayerId, content: &str) -> &Self {
        self.inbox
            .lock()
            .unwrap()
            .push_back(Incoming::new(Place::Direct(author), author, content));
        self
    }

    fn votes(&self, ballots: &[(PlayerId, usize)]) -> &Self {
        let ballots = ballots
            .iter()
            .map(|(voter, option)| Ballot {
                voter:  *voter,
                option: *option,
            })
            .collect();
        self.polls.lock().unwrap().push_back(ballots);
        self
    }

    fn sent(&self) -> Vec<(Place, Outgoing)> { self.sent.lock().unwrap().clone() }

    fn titled(&self, place: Place, title: &str) -> Vec<Outgoing> {
        self.sent()
            .into_iter()
            .filter(|(to, message)| *to == place && message.title_is(title))
            .map(|(_, message)| message)
            .collect()
    }

    fn images(&self, place: Place, filename: &str) -> usize {
        self.sent()
            .iter()
            .filter(|(to, message)| {
                *to == place
                    && message
                        .attachment
                        .as_ref()
                        .is_some_and(|attachment| attachment.filename == filename)
            })
            .count()
    }
}

#[async_trait]
impl GameChannel for ScriptedChannel {
    async fn next_message(&self, filters: &[Filter]) -> Option<Incoming> {
        let mut inbox = self.inbox.lock().unwrap();
        while let Some(incoming) = inbox.pop_front() {
            if filters.iter().any(|filter| filter.accepts(&incoming)) {
                return Some(incoming);
            }
        }
        None
    }

    async fn poll(&self, _poll: &Poll, _window: Duration) -> Result<Vec<Ballot>, DeliveryError> {
        Ok(self.polls.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn send(&self, to: Place, message: Outgoing) -> Result<(), DeliveryError> {
        if let Place::Direct(player) = to {
            if self.closed.contains(&player) {
                return Err(DeliveryError::DirectMessagesClosed(player));
            }
        }
        if let Some((title, images)) = &self.lose_boards_on {
            if to == Place::Room && message.title_is(title) {
                Self::lose_boards(images);
            }
        }
        self.sent.lock().unwrap().push((to, message));
        Ok(())
    }
}

struct Fixture {
    services: GameServices,
    images:   TempDir,
}

async fn fixture() -> Fixture {
    let images = TempDir::new().unwrap();
    let services = GameServices {
        words:       WordBank::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/dictionaries")),
        renderer:    Arc::new(BoardRenderer::new(Sizing::new(200, 120, 20, 5))),
        artifacts:   ArtifactStore::new(images.path()),
        stats:       StatsStore::in_memory().await.unwrap(),
        vote_window: Duration::ZERO,
    };
    services
        .stats
        .register_all([1, 2, 3, 4, 5, 6].map(PlayerId))
        .await
        .unwrap();
    Fixture { services, images }
}

/// Nine red words so red moves first, eight blue, `bomb` and seven neutral.
fn words() -> GameWords {
    GameWords {
        red:     (1..=9).map(|i| format!("red{i}")).collect(),
        blue:    (1..=8).map(|i| format!("blue{i}")).collect(),
        endgame: "bomb".to_string(),
        neutral: (1..=7).map(|i| format!("plain{i}")).collect(),
    }
}

fn engine() -> TurnEngine {
    TurnEngine::new(
        Board::new(words(), &mut StdRng::seed_from_u64(5)),
        Roster::new(Team::Red, &[RED_CAPTAIN, RED_OPERATIVE, PlayerId(3)], RED_CAPTAIN),
        Roster::new(Team::Blue, &[BLUE_CAPTAIN, BLUE_OPERATIVE, PlayerId(6)], BLUE_CAPTAIN),
    )
}

async fn run(channel: &Arc<ScriptedChannel>, services: &GameServices) -> fmhy_bot::codenames::Result<Outcome> {
    let channel: Arc<dyn GameChannel> = channel.clone();
    Session::start(channel, services, engine()).await?.run().await
}

fn leftover_images(images: &TempDir) -> usize { std::fs::read_dir(images.path()).unwrap().count() }

#[tokio::test]
async fn opening_the_endgame_word_hands_the_win_to_the_other_team() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel.direct(RED_CAPTAIN, "spy 2").room(RED_OPERATIVE, "bomb");

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::WonByEndgame(Team::Blue));

    let blue_captain = services.stats.stats(BLUE_CAPTAIN).await.unwrap().unwrap();
    assert_eq!(
        (
            blue_captain.games,
            blue_captain.wins,
            blue_captain.games_as_captain,
            blue_captain.wins_as_captain
        ),
        (1, 1, 1, 1)
    );
    let red_operative = services.stats.stats(RED_OPERATIVE).await.unwrap().unwrap();
    assert_eq!((red_operative.games, red_operative.wins), (1, 0));
    let red_captain = services.stats.stats(RED_CAPTAIN).await.unwrap().unwrap();
    assert_eq!((red_captain.games, red_captain.games_as_captain, red_captain.wins), (1, 1, 0));

    let over = channel.titled(Place::Room, messages::GAME_OVER_TITLE);
    assert_eq!(over.len(), 1);
    assert_eq!(
        over[0].description.as_deref(),
        Some(messages::won_by_endgame(Team::Blue).as_str())
    );
    assert_eq!(channel.titled(Place::Direct(BLUE_OPERATIVE), messages::TEAM_WON_TITLE).len(), 1);
    assert_eq!(channel.titled(Place::Direct(RED_OPERATIVE), messages::TEAM_LOST_TITLE).len(), 1);
}

#[tokio::test]
async fn boards_go_to_the_room_and_both_captains() {
    let Fixture { services, images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel.direct(RED_CAPTAIN, "spy 2").room(RED_OPERATIVE, "bomb");

    run(&channel, &services).await.unwrap();

    // Once at the start and once for the final board.
    assert_eq!(channel.images(Place::Room, messages::PLAYER_BOARD_FILE), 2);
    assert_eq!(channel.images(Place::Direct(RED_CAPTAIN), messages::CAPTAIN_BOARD_FILE), 2);
    assert_eq!(channel.images(Place::Direct(BLUE_CAPTAIN), messages::CAPTAIN_BOARD_FILE), 2);
    assert_eq!(channel.images(Place::Direct(RED_OPERATIVE), messages::CAPTAIN_BOARD_FILE), 0);

    assert_eq!(channel.images(Place::Room, messages::INITIAL_BOARD_FILE), 1);
    assert_eq!(leftover_images(&images), 0);
}

#[tokio::test]
async fn opening_an_opponent_word_tells_their_captain() {
    let Fixture { services, images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel.direct(RED_CAPTAIN, "spy 1").room(RED_OPERATIVE, "blue3");

    // Nobody answers afterwards.
    let result = run(&channel, &services).await;
    assert!(matches!(result, Err(Error::Abandoned)));

    let lucky = channel.titled(Place::Direct(BLUE_CAPTAIN), messages::LUCKY_TITLE);
    assert_eq!(lucky.len(), 1);
    assert_eq!(
        lucky[0].description.as_deref(),
        Some(messages::opponents_opened_your_word("blue3").as_str())
    );
    assert_eq!(channel.titled(Place::Room, messages::MISS_TITLE).len(), 1);

    // The game still shows the starting board and cleans up.
    assert_eq!(channel.titled(Place::Room, messages::INITIAL_BOARD).len(), 1);
    assert_eq!(leftover_images(&images), 0);
    let stats = services.stats.stats(RED_CAPTAIN).await.unwrap().unwrap();
    assert_eq!(stats.games, 0);
}

#[tokio::test]
async fn majority_vote_stops_the_game_without_statistics() {
    let Fixture { services, images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel
        .direct(RED_CAPTAIN, "spy 2")
        .room(BLUE_OPERATIVE, "000")
        .votes(&[
            (PlayerId(1), 0),
            (PlayerId(2), 0),
            (PlayerId(3), 0),
            (PlayerId(4), 1),
            (PlayerId(5), 1),
        ]);

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::StoppedByVote);

    let verdicts = channel.titled(Place::Room, messages::STOP_VOTE_TITLE);
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].description.as_deref(), Some(messages::GAME_STOPPED));
    assert!(channel.titled(Place::Room, messages::GAME_OVER_TITLE).is_empty());

    for player in [1, 2, 3, 4, 5, 6].map(PlayerId) {
        let stats = services.stats.stats(player).await.unwrap().unwrap();
        assert_eq!((stats.games, stats.wins), (0, 0));
    }
    assert_eq!(leftover_images(&images), 0);
}

#[tokio::test]
async fn tied_vote_keeps_playing() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel
        .direct(RED_CAPTAIN, "spy 2")
        .room(RED_OPERATIVE, "000")
        .votes(&[(PlayerId(1), 0), (PlayerId(4), 1)])
        .room(RED_OPERATIVE, "bomb");

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::WonByEndgame(Team::Blue));

    let verdicts = channel.titled(Place::Room, messages::STOP_VOTE_TITLE);
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].description.as_deref(), Some(messages::GAME_CONTINUED));
}

#[tokio::test]
async fn opening_every_team_word_wins() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel.direct(RED_CAPTAIN, "spy 9");
    for i in 1..=9 {
        channel.room(RED_OPERATIVE, &format!("red{i}"));
    }

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::WonByAllWords(Team::Red));

    let red_operative = services.stats.stats(RED_OPERATIVE).await.unwrap().unwrap();
    assert_eq!((red_operative.games, red_operative.wins), (1, 1));
    assert_eq!(channel.titled(Place::Room, messages::SUCCESS_TITLE).len(), 9);
}

#[tokio::test]
async fn ignores_messages_from_players_out_of_turn() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel
        // Only the captain of the moving team may give a clue, and only privately.
        .direct(BLUE_CAPTAIN, "spy 3")
        .room(RED_CAPTAIN, "spy 3")
        .direct(RED_CAPTAIN, "spy 2")
        // Blue isn't guessing and captains never guess.
        .room(BLUE_OPERATIVE, "bomb")
        .room(RED_CAPTAIN, "bomb")
        .room(RED_OPERATIVE, "red1")
        .room(RED_OPERATIVE, "0")
        .direct(BLUE_CAPTAIN, "cat 1")
        .room(BLUE_OPERATIVE, "bomb");

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::WonByEndgame(Team::Red));
    assert_eq!(channel.titled(Place::Direct(BLUE_CAPTAIN), messages::CLUE_ACCEPTED).len(), 1);
}

#[tokio::test]
async fn closed_direct_messages_are_reported_in_the_room() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::with_closed_direct_messages(BLUE_CAPTAIN));
    channel.direct(RED_CAPTAIN, "spy 2").room(RED_OPERATIVE, "bomb");

    run(&channel, &services).await.unwrap();

    let notices = channel.titled(Place::Room, messages::DIRECT_MESSAGES_CLOSED_TITLE);
    assert!(!notices.is_empty());
    assert!(notices
        .iter()
        .all(|notice| notice.description.as_deref() == Some(messages::direct_messages_closed(BLUE_CAPTAIN).as_str())));
    assert!(channel
        .sent()
        .iter()
        .all(|(to, _)| *to != Place::Direct(BLUE_CAPTAIN)));
}

#[tokio::test]
async fn teams_get_the_captains_they_voted_for() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = ScriptedChannel::new();
    // Option 0 is a random captain, then one option per member.
    channel
        .votes(&[(PlayerId(1), 2), (PlayerId(3), 2)])
        .votes(&[(PlayerId(5), 1), (PlayerId(6), 1), (PlayerId(4), 3)]);
    let teams = Teams {
        red:  vec![PlayerId(1), PlayerId(2), PlayerId(3)],
        blue: vec![PlayerId(4), PlayerId(5), PlayerId(6)],
    };

    let (red, blue) = session::form_teams(&channel, &services, &teams, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();

    assert_eq!(red.captain, PlayerId(2));
    assert_eq!(red.operatives, [PlayerId(1), PlayerId(3)]);
    assert_eq!(blue.captain, PlayerId(4));
    assert_eq!(channel.titled(Place::Room, messages::START_ANNOUNCEMENT).len(), 1);
    assert_eq!(
        channel
            .titled(Place::Room, &messages::team_roster_title(Team::Red))
            .len(),
        1
    );
}

/// The room's posts reduced to player boards, successful guesses and blue's turn.
fn room_timeline(channel: &ScriptedChannel) -> Vec<&'static str> {
    let blue_turn = messages::waiting_title(Team::Blue);
    channel
        .sent()
        .into_iter()
        .filter(|(to, _)| *to == Place::Room)
        .filter_map(|(_, message)| {
            let board = message
                .attachment
                .as_ref()
                .is_some_and(|attachment| attachment.filename == messages::PLAYER_BOARD_FILE);
            if board {
                Some("board")
            } else if message.title_is(messages::SUCCESS_TITLE) {
                Some("hit")
            } else if message.title_is(&blue_turn) {
                Some("blue turn")
            } else {
                None
            }
        })
        .collect()
}

#[tokio::test]
async fn last_allowed_guess_ends_the_turn_without_an_extra_board() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    // A clue for one word allows one bonus guess.
    channel
        .direct(RED_CAPTAIN, "spy 1")
        .room(RED_OPERATIVE, "red1")
        .room(RED_OPERATIVE, "red2");

    let result = run(&channel, &services).await;
    assert!(matches!(result, Err(Error::Abandoned)));

    // The third board opens blue's turn, nothing follows the second hit.
    assert_eq!(room_timeline(&channel), [
        "board",
        "hit",
        "board",
        "hit",
        "board",
        "blue turn"
    ]);
    assert_eq!(channel.images(Place::Direct(RED_CAPTAIN), messages::CAPTAIN_BOARD_FILE), 3);
    assert_eq!(channel.titled(Place::Direct(BLUE_CAPTAIN), messages::CLUE_REQUEST_TITLE).len(), 1);
}

#[tokio::test]
async fn passing_shows_the_room_a_board_but_not_the_captains() {
    let Fixture { services, images: _images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::new());
    channel
        .direct(RED_CAPTAIN, "spy 2")
        .room(RED_OPERATIVE, "red1")
        .room(RED_OPERATIVE, "0");

    let result = run(&channel, &services).await;
    assert!(matches!(result, Err(Error::Abandoned)));

    assert_eq!(room_timeline(&channel), ["board", "hit", "board", "board", "blue turn"]);
    // The start and the hit, the pass changed nothing they can see.
    assert_eq!(channel.images(Place::Direct(RED_CAPTAIN), messages::CAPTAIN_BOARD_FILE), 2);
    assert_eq!(channel.images(Place::Direct(BLUE_CAPTAIN), messages::CAPTAIN_BOARD_FILE), 2);
}

#[tokio::test]
async fn results_are_recorded_when_the_final_board_is_missing() {
    let Fixture { services, images } = fixture().await;
    let channel = Arc::new(ScriptedChannel::losing_boards_on(
        messages::MISS_TITLE,
        images.path().to_path_buf(),
    ));
    channel.direct(RED_CAPTAIN, "spy 2").room(RED_OPERATIVE, "bomb");

    let outcome = run(&channel, &services).await.unwrap();
    assert_eq!(outcome, Outcome::WonByEndgame(Team::Blue));

    // Only the opening board made it out.
    assert_eq!(channel.images(Place::Room, messages::PLAYER_BOARD_FILE), 1);
    assert_eq!(channel.titled(Place::Room, messages::GAME_OVER_TITLE).len(), 1);
    let blue_captain = services.stats.stats(BLUE_CAPTAIN).await.unwrap().unwrap();
    assert_eq!((blue_captain.games, blue_captain.wins), (1, 1));
    let red_operative = services.stats.stats(RED_OPERATIVE).await.unwrap().unwrap();
    assert_eq!((red_operative.games, red_operative.wins), (1, 0));
}
