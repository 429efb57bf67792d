use std::env;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{defaults, paths, Error, Result};

pub mod codenames;
pub mod links;
pub mod wiki;

/// Configurations required to host the bot
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub secrets:              ConfigurationSecrets,
    #[serde(default = "defaults::random_error_message")]
    pub random_error_message: ConfigurationRandomErrorMessages,
    /// Codenames games are disabled without this section.
    pub codenames:            Option<codenames::Codenames>,
    /// The duplicate link check is disabled without this section.
    pub links:                Option<links::Links>,
    /// Where `/search`, `/list` and the link check read the wiki from.
    #[serde(default)]
    pub wiki:                 wiki::Wiki,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// API keys and other secrets
pub struct ConfigurationSecrets {
    /// Discord bot token
    pub token:    String,
    /// SQLite database URL (This is either configured here or via the `FMHY_DATABASE`
    /// env variable).
    pub database: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
/// If, and where, to find error messages to randomly select from.
pub enum ConfigurationRandomErrorMessages {
    Boolean(bool),
    Path(std::path::PathBuf),
}

impl Configuration {
    /// Read a `Configuration` from toml located at `path`, anything not found in the file
    /// will be grabbed from the corresponding environment variables.
    ///
    /// # Usage
    ///
    /// ```no_run
    /// # use std::path::PathBuf;
    /// # use fmhy_bot::config::Configuration;
    /// # tokio_test::block_on(async {
    /// let file = PathBuf::from("fmhy-bot.toml");
    /// let config = Configuration::parse(file).await.unwrap();
    /// dbg!(config);
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Will error when:
    ///
    /// - `Path` cannot be read from successfully
    /// - `Path`'s contents cannot be parsed into a `Configuration`
    pub async fn parse(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        let path = path.into();
        let file_contents = fs::read_to_string(&path).await.map_err(Error::Io)?;
        Self::from_toml_str(&file_contents).map_err(|error| {
            Error::ConfigurationParse {
                path,
                error: Box::new(error),
            }
        })
    }

    fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(contents)?;
        config.secrets.database = config.secrets.database.or(env::var("FMHY_DATABASE").ok());
        Ok(config)
    }

    /// The configured database URL, or one inside the platform data directory.
    pub fn database_url(&self) -> String {
        self.secrets
            .database
            .clone()
            .unwrap_or_else(paths::default_database_url)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            secrets:              ConfigurationSecrets::default(),
            random_error_message: defaults::random_error_message(),
            codenames:            Some(codenames::Codenames::default()),
            links:                None,
            wiki:                 wiki::Wiki::default(),
        }
    }
}

impl ConfigurationSecrets {
    const DEFAULT_DISCORD_TOKEN: &'static str = "<DISCORD_TOKEN>";
}

impl Default for ConfigurationSecrets {
    fn default() -> Self {
        Self {
            token:    Self::DEFAULT_DISCORD_TOKEN.to_string(),
            database: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Error messages parsed from the file provided in the `Configuration`
pub struct ErrorMessages {
    pub(crate) messages: Vec<(String, String)>,
}

impl ErrorMessages {
    /// Read an `ErrorMessages` from JSON located at `path`.
    ///
    /// # Errors
    ///
    /// Will error when:
    ///
    /// - `Path` cannot be read from successfully
    /// - `Path`'s contents cannot be parsed into `ErrorMessages`
    pub async fn from_json(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_contents = fs::read_to_string(&path).await.map_err(Error::Io)?;
        let parsed: Vec<[String; 2]> = serde_json::from_str(&file_contents).map_err(|e| {
            Error::MessageParse {
                path:  path.into(),
                error: e,
            }
        })?;

        let messages = parsed
            .into_iter()
            .map(|mut x| (std::mem::take(&mut x[0]), std::mem::take(&mut x[1])))
            .collect::<Vec<_>>();

        if messages.is_empty() {
            return Ok(Self::default());
        }

        Ok(ErrorMessages { messages })
    }
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            messages: vec![("There was an error".to_string(), "Please try again.".to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const FULL: &str = r#"
        random_error_message = "/tmp/errors.json"

        [secrets]
        token = "abc"
        database = "sqlite://games.sqlite"

        [codenames]
        channel = 1234
        host_role = 42
        font = "fonts/Roboto-Bold.ttf"
        vote_window = 20
        dictionaries = [{ name = "std", label = "Standard" }]

        [codenames.roles]
        red_team = 1
        blue_team = 2
        red_spymaster = 3
        blue_spymaster = 4

        [links]
        channels = [10, 11]

        [wiki]
        refresh_interval = 60
    "#;

    #[test]
    fn parses_a_full_configuration() {
        let config = Configuration::from_toml_str(FULL).unwrap();
        assert_eq!(config.secrets.token, "abc");
        assert_eq!(config.database_url(), "sqlite://games.sqlite");
        assert_eq!(
            config.random_error_message,
            ConfigurationRandomErrorMessages::Path("/tmp/errors.json".into())
        );

        let codenames = config.codenames.unwrap();
        assert_eq!(codenames.channel, Some(1234));
        assert_eq!(codenames.host_role, Some(42));
        assert_eq!(codenames.vote_window(), Duration::from_secs(20));
        assert_eq!(codenames.lobby_timeout, 30);
        assert_eq!(codenames.default_dictionary, "std");
        assert_eq!(codenames.dictionaries.len(), 1);
        assert_eq!(codenames.roles.unwrap().blue_spymaster, 4);

        let links = config.links.unwrap();
        assert_eq!(links.channels, [10, 11]);
        assert_eq!(config.wiki.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.wiki.url, "https://api.fmhy.net/single-page");
        assert_eq!(config.wiki.list_url, "https://rentry.co/oghty/raw");
    }

    #[test]
    fn optional_sections_stay_disabled() {
        let config = Configuration::from_toml_str("[secrets]\ntoken = \"abc\"").unwrap();
        assert!(config.codenames.is_none());
        assert!(config.links.is_none());
        assert_eq!(config.wiki, wiki::Wiki::default());
        assert_eq!(config.random_error_message, ConfigurationRandomErrorMessages::Boolean(true));
    }

    #[tokio::test]
    async fn error_messages_are_read_as_pairs() {
        let dir = temp_dir::TempDir::new().unwrap();
        let path = dir.child("error_messages.json");
        tokio::fs::write(&path, r#"[["Oops", "Try later."], ["Uh oh", "Sorry."]]"#)
            .await
            .unwrap();

        let messages = ErrorMessages::from_json(&path).await.unwrap();
        assert_eq!(messages.messages[1], ("Uh oh".to_string(), "Sorry.".to_string()));

        tokio::fs::write(&path, "{").await.unwrap();
        assert!(matches!(
            ErrorMessages::from_json(&path).await,
            Err(Error::MessageParse { .. })
        ));
    }
}
