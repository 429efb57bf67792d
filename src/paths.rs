use std::path::PathBuf;

use directories::ProjectDirs;
use lazy_static::lazy_static;

#[cfg(target_os = "linux")]
mod fallback {
    pub const CONFIG_FILE: &str = "/etc/fmhy-bot/fmhy-bot.toml";
    pub const ERROR_MESSAGES_FILE: &str = "/etc/fmhy-bot/error_messages.json";
    pub const DATA_DIRECTORY: &str = "/var/lib/fmhy-bot";
}

#[cfg(not(target_os = "linux"))]
mod fallback {
    pub const CONFIG_FILE: &str = "";
    pub const ERROR_MESSAGES_FILE: &str = "";
    pub const DATA_DIRECTORY: &str = "";
}

lazy_static! {
pub static ref PROJECT_DIR: Option<ProjectDirs> = ProjectDirs::from("net", "fmhy", "fmhy-bot");

/// An existing configuration file.
///
/// # File Locations
///
/// ## Linux
///
/// 1. `$XDG_CONFIG_HOME/fmhy-bot/fmhy-bot.toml` or `$HOME/.config/fmhy-bot/fmhy-bot.toml`
/// 2. `/etc/fmhy-bot/fmhy-bot.toml`
///
/// ## macOS
///
/// 1. `$HOME/Library/Application Support/net.fmhy.fmhy-bot/fmhy-bot.toml`
///
/// ## Windows
///
/// 1. `%APPDATA%\fmhy\fmhy-bot\config\fmhy-bot.toml`
pub static ref CONFIGURATION_FILE: Option<PathBuf> = {
    let mut paths = Vec::with_capacity(2);
    if let Some(project_dirs) = PROJECT_DIR.as_ref() {
        paths.push(project_dirs.config_dir().join("fmhy-bot.toml"));
    }
    if !fallback::CONFIG_FILE.is_empty() {
        paths.push(PathBuf::from(fallback::CONFIG_FILE));
    }

    paths.into_iter().find(|path| path.is_file())
};

/// Like [`CONFIGURATION_FILE`] but for `error_messages.json`.
pub static ref ERROR_MESSAGES_FILE: Option<PathBuf> = {
    let mut paths = Vec::with_capacity(2);
    if let Some(project_dirs) = PROJECT_DIR.as_ref() {
        paths.push(project_dirs.config_dir().join("error_messages.json"));
    }
    if !fallback::ERROR_MESSAGES_FILE.is_empty() {
        paths.push(PathBuf::from(fallback::ERROR_MESSAGES_FILE));
    }

    paths.into_iter().find(|path| path.is_file())
};

/// Where the statistics database lives unless configured otherwise.
pub static ref DATA_DIRECTORY: PathBuf = PROJECT_DIR
    .as_ref()
    .map(|project_dirs| project_dirs.data_dir().to_path_buf())
    .unwrap_or_else(|| PathBuf::from(fallback::DATA_DIRECTORY));
}

/// The default SQLite URL for the statistics database.
pub fn default_database_url() -> String {
    format!("sqlite://{}", DATA_DIRECTORY.join("fmhy-bot.sqlite").display())
}
