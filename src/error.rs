use thiserror::Error;

use crate::codenames;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ClientInitializationError: {0}")]
    ClientInitialization(Box<serenity::Error>),

    #[error("IOError: {0}")]
    Io(tokio::io::Error),

    #[error("MissingConfigurationFile: No configuration file was given or found")]
    MissingConfigurationFile,

    #[error("ConfigurationParseError: \"{}\": {error}", path.display())]
    ConfigurationParse {
        path:  std::path::PathBuf,
        error: Box<toml::de::Error>,
    },

    #[error("MessageParseError: \"{}\": {error}", path.display())]
    MessageParse {
        path:  std::path::PathBuf,
        error: serde_json::Error,
    },

    #[error("ExpectedSuboptionError: A suboption was exepcted but discord didn't provide one.")]
    ExpectedSuboption,

    #[error("HTTPRequestError: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("CommandMisuseError: {0}")]
    CommandMisuse(String),

    #[error("DiscordError: {0}")]
    Discord(#[from] serenity::Error),

    #[error("InternalLogicError: Something's wrong on this end! Sorry.")]
    InternalLogic,

    #[error("FeatureDisabled: {0}")]
    FeatureDisabled(String),

    #[error("NeverPlayedError: {0} hasn't played Codenames yet")]
    NeverPlayed(String),

    #[error("Base64DecodeError: {0}")]
    Base64Decode(String),

    #[error("CodenamesError: {0}")]
    Codenames(codenames::Error),
}

impl Error {
    pub fn report(&self) -> &Self {
        tracing::error!("{self}");
        self
    }

    pub fn code(&self) -> String {
        let n = match self {
            Error::ClientInitialization(_) => 1,
            Error::Io(_) => 2,
            Error::MissingConfigurationFile => 3,
            Error::ConfigurationParse { .. } => 4,
            Error::MessageParse { .. } => 5,
            Error::ExpectedSuboption => 6,
            Error::HttpRequest(_) => 7,
            Error::CommandMisuse(_) => 8,
            Error::Discord(_) => 9,
            Error::InternalLogic => 14,
            Error::FeatureDisabled(_) => 16,
            Error::NeverPlayed(_) => 19,
            Error::Base64Decode(_) => 20,
            Error::Codenames(_) => 21,
        };

        format!("0x{n:02X}")
    }
}

impl From<codenames::Error> for Error {
    fn from(value: codenames::Error) -> Self {
        match value {
            codenames::Error::Io(e) => Self::Io(e),
            e => Self::Codenames(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_two_digit_hex() {
        assert_eq!(Error::InternalLogic.code(), "0x0E");
        assert_eq!(Error::Codenames(codenames::Error::NotHost).code(), "0x15");
        assert_eq!(Error::MissingConfigurationFile.code(), "0x03");
    }

    #[test]
    fn codenames_io_errors_stay_io_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(codenames::Error::Io(io)), Error::Io(_)));
        assert!(matches!(Error::from(codenames::Error::LobbyClosed), Error::Codenames(_)));
    }
}
