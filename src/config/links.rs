use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Links {
    /// Channels whose messages are checked for links already in the wiki.
    pub channels: Vec<u64>,
}
