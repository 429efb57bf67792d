//! Per-player game counters kept in SQLite.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqliteConnection, SqlitePool,
};
use tracing::{debug, warn};

use super::{election::Roster, Error, PlayerId, Result};

/// One column of the `players` table that only ever goes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Games,
    GamesAsCaptain,
    Wins,
    WinsAsCaptain,
}

impl Counter {
    const fn column(self) -> &'static str {
        match self {
            Counter::Games => "games",
            Counter::GamesAsCaptain => "games_cap",
            Counter::Wins => "wins",
            Counter::WinsAsCaptain => "wins_cap",
        }
    }
}

const WINNING_CAPTAIN: &[Counter] = &[
    Counter::Games,
    Counter::GamesAsCaptain,
    Counter::Wins,
    Counter::WinsAsCaptain,
];
const WINNING_OPERATIVE: &[Counter] = &[Counter::Games, Counter::Wins];
const LOSING_CAPTAIN: &[Counter] = &[Counter::Games, Counter::GamesAsCaptain];
const LOSING_OPERATIVE: &[Counter] = &[Counter::Games];

/// The two sides of a game that ended with a winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub winners: Roster,
    pub losers:  Roster,
}

impl GameResult {
    /// Every player of the game with the counters their result adds to.
    pub fn increments(&self) -> Vec<(PlayerId, &'static [Counter])> {
        let mut increments = vec![(self.winners.captain, WINNING_CAPTAIN)];
        increments.extend(self.winners.operatives.iter().map(|p| (*p, WINNING_OPERATIVE)));
        increments.push((self.losers.captain, LOSING_CAPTAIN));
        increments.extend(self.losers.operatives.iter().map(|p| (*p, LOSING_OPERATIVE)));
        increments
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PlayerStats {
    pub first_played:     NaiveDate,
    pub games:            i64,
    #[sqlx(rename = "games_cap")]
    pub games_as_captain: i64,
    pub wins:             i64,
    #[sqlx(rename = "wins_cap")]
    pub wins_as_captain:  i64,
}

impl PlayerStats {
    pub fn overall(&self) -> Record {
        Record {
            games: self.games,
            wins:  self.wins,
        }
    }

    pub fn as_captain(&self) -> Record {
        Record {
            games: self.games_as_captain,
            wins:  self.wins_as_captain,
        }
    }

    /// Games played as an operative.
    pub fn in_team(&self) -> Record {
        Record {
            games: self.games - self.games_as_captain,
            wins:  self.wins - self.wins_as_captain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub games: i64,
    pub wins:  i64,
}

impl Record {
    pub fn winrate(&self) -> String { winrate(self.games, self.wins) }
}

/// `-` when there are no games, otherwise the rounded percentage like `67%`.
pub fn winrate(games: i64, wins: i64) -> String {
    if games <= 0 {
        return "-".to_string();
    }
    format!("{}%", (wins as f64 / games as f64 * 100.0).round() as i64)
}

/// What a leaderboard ranks players by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    Overall,
    Captain,
    Team,
}

impl Ranking {
    pub const fn name(self) -> &'static str {
        match self {
            Ranking::Overall => "overall",
            Ranking::Captain => "captain",
            Ranking::Team => "team",
        }
    }

    const fn query(self) -> &'static str {
        match self {
            Ranking::Overall => {
                "SELECT id, games, wins, CAST(wins AS REAL) / games AS winrate
                 FROM players
                 WHERE games > 0
                 ORDER BY winrate DESC, games DESC
                 LIMIT ?"
            }
            Ranking::Captain => {
                "SELECT id, games_cap AS games, wins_cap AS wins, CAST(wins_cap AS REAL) / games_cap AS winrate
                 FROM players
                 WHERE games_cap > 0
                 ORDER BY winrate DESC, games_cap DESC
                 LIMIT ?"
            }
            Ranking::Team => {
                "SELECT id, games - games_cap AS games, wins - wins_cap AS wins,
                        CAST(wins - wins_cap AS REAL) / (games - games_cap) AS winrate
                 FROM players
                 WHERE games - games_cap > 0
                 ORDER BY winrate DESC, games - games_cap DESC
                 LIMIT ?"
            }
        }
    }
}

impl FromStr for Ranking {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overall" => Ok(Ranking::Overall),
            "captain" => Ok(Ranking::Captain),
            "team" => Ok(Ranking::Team),
            other => Err(format!("Unknown leaderboard category \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Standing {
    id:          i64,
    pub games:   i64,
    pub wins:    i64,
    pub winrate: f64,
}

impl Standing {
    pub fn player(&self) -> PlayerId { PlayerId(self.id as u64) }
}

pub const MAX_LEADERBOARD_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct StatsStore {
    pool: SqlitePool,
}

impl StatsStore {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    /// Opens (creating if needed) the database at `url` and migrates it.
    pub async fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Opened statistics database \"{url}\"");
        Ok(Self { pool })
    }

    /// A private database that lives as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }

    /// Creates a zeroed record for `player` unless one exists. Returns whether a
    /// record was created.
    pub async fn ensure_registered(&self, player: PlayerId) -> Result<bool> {
        let mut connection = self.pool.acquire().await?;
        register(&mut connection, player).await
    }

    pub async fn register_all(&self, players: impl IntoIterator<Item = PlayerId>) -> Result<usize> {
        let mut created = 0;
        for player in players {
            if self.ensure_registered(player).await? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Adds one to each of `counters` for `player`.
    pub async fn increment(&self, player: PlayerId, counters: &[Counter]) -> Result<()> {
        let mut connection = self.pool.acquire().await?;
        increment(&mut connection, player, counters).await
    }

    /// Applies every player's increments for a finished game, all or nothing.
    pub async fn record_game(&self, result: &GameResult) -> Result<()> {
        let mut transaction = self.pool.begin().await?;
        for (player, counters) in result.increments() {
            increment(&mut transaction, player, counters).await?;
        }
        transaction.commit().await?;
        debug!(
            "Recorded a win for {} and a loss for {}",
            result.winners.team, result.losers.team
        );
        Ok(())
    }

    pub async fn stats(&self, player: PlayerId) -> Result<Option<PlayerStats>> {
        let stats = sqlx::query_as::<_, PlayerStats>(
            "SELECT first_played, games, games_cap, wins, wins_cap FROM players WHERE id = ?",
        )
        .bind(player.get() as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Like [`StatsStore::stats`] but a missing record is an error.
    pub async fn require_stats(&self, player: PlayerId) -> Result<PlayerStats> {
        self.stats(player).await?.ok_or(Error::PlayerNotFound(player))
    }

    /// The best players by win rate, then by games played. Players without games
    /// in the category are left out. `limit` is clamped to `1..=20`.
    pub async fn leaderboard(&self, ranking: Ranking, limit: u32) -> Result<Vec<Standing>> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_SIZE);
        let standings = sqlx::query_as::<_, Standing>(ranking.query())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(standings)
    }
}

async fn register(connection: &mut SqliteConnection, player: PlayerId) -> Result<bool> {
    let inserted = sqlx::query("INSERT OR IGNORE INTO players (id, first_played) VALUES (?, ?)")
        .bind(player.get() as i64)
        .bind(Utc::now().date_naive())
        .execute(&mut *connection)
        .await?
        .rows_affected();
    Ok(inserted == 1)
}

async fn increment(connection: &mut SqliteConnection, player: PlayerId, counters: &[Counter]) -> Result<()> {
    if counters.is_empty() {
        return Ok(());
    }

    let assignments = counters
        .iter()
        .map(|counter| format!("{0} = {0} + 1", counter.column()))
        .collect::<Vec<_>>()
        .join(", ");
    let statement = format!("UPDATE players SET {assignments} WHERE id = ?");

    let updated = sqlx::query(&statement)
        .bind(player.get() as i64)
        .execute(&mut *connection)
        .await?
        .rows_affected();

    if updated == 0 {
        warn!("Player {player} had no statistics record, creating one");
        register(connection, player).await?;
        sqlx::query(&statement)
            .bind(player.get() as i64)
            .execute(&mut *connection)
            .await?;
    }
    Ok(())
}
