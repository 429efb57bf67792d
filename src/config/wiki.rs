use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Wiki {
    /// A raw, single page copy of the wiki.
    #[serde(default = "defaults::wiki_url")]
    pub url:              String,
    /// The raw list of lists sampled by `/list`.
    #[serde(default = "defaults::list_url")]
    pub list_url:         String,
    /// Seconds
    #[serde(default = "defaults::refresh_interval")]
    pub refresh_interval: u64,
}

impl Wiki {
    pub fn refresh_interval(&self) -> Duration { Duration::from_secs(self.refresh_interval) }
}

impl Default for Wiki {
    fn default() -> Self {
        Self {
            url:              defaults::wiki_url(),
            list_url:         defaults::list_url(),
            refresh_interval: defaults::refresh_interval(),
        }
    }
}
