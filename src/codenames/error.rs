use thiserror::Error;

use super::PlayerId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Dictionary \"{0}\" doesn't exist or has no words")]
    DictionaryNotFound(String),

    #[error("Dictionary \"{dictionary}\" has only {found} distinct words but a game needs {needed}")]
    InsufficientWords {
        dictionary: String,
        found:      usize,
        needed:     usize,
    },

    #[error("\"{0}\" isn't on the board")]
    WordNotInGame(String),

    #[error("\"{0}\" has already been opened")]
    AlreadyOpened(String),

    #[error("Not enough players: each team needs at least {min} players")]
    NotEnoughPlayers { min: usize },

    #[error("Too many players: each team can have no more than {max} players")]
    TooManyPlayers { max: usize },

    #[error("Player {0} has never played Codenames")]
    PlayerNotFound(PlayerId),

    #[error("You are not a Codenames host")]
    NotHost,

    #[error("Registration for this game is closed")]
    LobbyClosed,

    #[error("Player {0} can't do that right now")]
    OutOfTurn(PlayerId),

    #[error("The game lost its input before it finished")]
    Abandoned,

    #[error("Couldn't render the board: {0}")]
    Render(#[from] image::ImageError),

    #[error("Couldn't load the card font: {0}")]
    Font(String),

    #[error("Board rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics storage: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Statistics schema: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Errors caused by what a player did (as opposed to the bot failing).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DictionaryNotFound(_)
                | Error::InsufficientWords { .. }
                | Error::WordNotInGame(_)
                | Error::AlreadyOpened(_)
                | Error::NotEnoughPlayers { .. }
                | Error::TooManyPlayers { .. }
                | Error::PlayerNotFound(_)
                | Error::NotHost
                | Error::LobbyClosed
                | Error::OutOfTurn(_)
        )
    }
}
