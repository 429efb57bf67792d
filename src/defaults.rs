use std::path::PathBuf;

use crate::config::{codenames::DictionaryEntry, ConfigurationRandomErrorMessages};

pub const fn random_error_message() -> ConfigurationRandomErrorMessages {
    ConfigurationRandomErrorMessages::Boolean(true)
}

pub fn dictionaries_dir() -> PathBuf { PathBuf::from("data/dictionaries") }

pub fn images_dir() -> PathBuf { std::env::temp_dir().join("fmhy-bot-boards") }

pub fn default_dictionary() -> String { "std".to_string() }

pub fn dictionaries() -> Vec<DictionaryEntry> {
    [
        ("std", "Original English (400 words)"),
        ("duet", "Original Duet (400 words)"),
    ]
    .into_iter()
    .map(|(name, label)| DictionaryEntry {
        name:  name.to_string(),
        label: label.to_string(),
    })
    .collect()
}

/// Seconds each vote stays open.
pub const fn vote_window() -> u64 { 15 }

/// Minutes a lobby waits for the host to start.
pub const fn lobby_timeout() -> i64 { 30 }

/// Seconds a downloaded copy of the wiki stays fresh.
pub const fn refresh_interval() -> u64 { 300 }

pub fn wiki_url() -> String { "https://api.fmhy.net/single-page".to_string() }

pub fn list_url() -> String { "https://rentry.co/oghty/raw".to_string() }
