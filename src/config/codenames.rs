use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::defaults;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Codenames {
    /// `/codenames start` only works in this channel when set.
    pub channel:            Option<u64>,
    /// Members with this role may host and cancel any lobby.
    pub host_role:          Option<u64>,
    #[serde(default = "defaults::dictionaries_dir")]
    pub dictionaries_dir:   PathBuf,
    /// Dictionaries offered in the lobby, in menu order.
    #[serde(default = "defaults::dictionaries")]
    pub dictionaries:       Vec<DictionaryEntry>,
    #[serde(default = "defaults::default_dictionary")]
    pub default_dictionary: String,
    #[serde(default = "defaults::images_dir")]
    pub images_dir:         PathBuf,
    /// TrueType font for the card labels. Boards are drawn without text when it's
    /// missing.
    pub font:               Option<PathBuf>,
    /// Seconds
    #[serde(default = "defaults::vote_window")]
    pub vote_window:        u64,
    /// Minutes
    #[serde(default = "defaults::lobby_timeout")]
    pub lobby_timeout:      i64,
    pub roles:              Option<TeamRoles>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub name:  String,
    pub label: String,
}

/// Roles handed out for the duration of a game.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TeamRoles {
    pub red_team:       u64,
    pub blue_team:      u64,
    pub red_spymaster:  u64,
    pub blue_spymaster: u64,
}

impl Codenames {
    pub fn vote_window(&self) -> Duration { Duration::from_secs(self.vote_window) }

    pub fn lobby_timeout(&self) -> chrono::Duration { chrono::Duration::minutes(self.lobby_timeout) }

    /// The label shown for `name`, or the name itself for unlisted dictionaries.
    pub fn dictionary_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.dictionaries
            .iter()
            .find(|entry| entry.name == name)
            .map_or(name, |entry| entry.label.as_str())
    }
}

impl Default for Codenames {
    fn default() -> Self {
        Self {
            channel:            None,
            host_role:          None,
            dictionaries_dir:   defaults::dictionaries_dir(),
            dictionaries:       defaults::dictionaries(),
            default_dictionary: defaults::default_dictionary(),
            images_dir:         defaults::images_dir(),
            font:               None,
            vote_window:        defaults::vote_window(),
            lobby_timeout:      defaults::lobby_timeout(),
            roles:              None,
        }
    }
}
