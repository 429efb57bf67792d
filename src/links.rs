//! Warns when someone posts a link the wiki already lists.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::{builder::CreateEmbed, model::Colour};
use tracing::debug;

use crate::{config, wiki::Wiki, Result};

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https?)://(?:ww(?:w|\d+)\.)?((?:[\w_-]+(?:\.[\w_-]+)+)[\w.,@?^=%&:/~+#-]*[\w@?^=%&~+-])")
        .unwrap()
});

/// A link as `(scheme, host and path)`, without any `www.` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    pub scheme: String,
    pub rest:   String,
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}://{}", self.scheme, self.rest) }
}

pub fn extract_links(text: &str) -> BTreeSet<Link> {
    URL_PATTERN
        .captures_iter(text)
        .map(|captures| {
            Link {
                scheme: captures[1].to_string(),
                rest:   captures[2].to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub duplicates: Vec<Link>,
    pub fresh:      Vec<Link>,
}

impl LinkReport {
    pub fn new(posted: BTreeSet<Link>, wiki: &HashSet<Link>) -> Self {
        let (duplicates, fresh) = posted.into_iter().partition(|link| wiki.contains(link));
        Self { duplicates, fresh }
    }

    /// The reply to post, if anything was a duplicate.
    pub fn warning(&self) -> Option<CreateEmbed> {
        if self.duplicates.is_empty() {
            return None;
        }

        let embed = CreateEmbed::new()
            .title(":warning: Warning")
            .colour(Colour::ORANGE);
        let embed = match (self.duplicates.len(), self.fresh.len()) {
            (1, 0) => embed.description("**This link is already in the wiki!**"),
            (_, 0) => embed.description("**All of these links are already in the wiki!**"),
            _ => {
                embed
                    .field("Duplicate Links", join(&self.duplicates), false)
                    .field("Non-Duplicate Links", join(&self.fresh), false)
            }
        };
        Some(embed)
    }
}

fn join(links: &[Link]) -> String { links.iter().map(Link::to_string).collect::<Vec<_>>().join("\n") }

/// Compares posted links with the cached copy of the wiki.
pub struct LinkChecker {
    settings: config::links::Links,
    wiki:     Arc<Wiki>,
}

impl LinkChecker {
    pub fn new(settings: config::links::Links, wiki: Arc<Wiki>) -> Self { Self { settings, wiki } }

    /// Whether messages in `channel` are checked.
    pub fn watches(&self, channel: u64) -> bool { self.settings.channels.contains(&channel) }

    /// `None` when `content` has no links.
    pub async fn check(&self, content: &str) -> Result<Option<LinkReport>> {
        let posted = extract_links(content);
        if posted.is_empty() {
            return Ok(None);
        }

        let index = self.wiki.index().await?;
        let report = LinkReport::new(posted, &index.links);
        debug!(
            "{} duplicate and {} new links",
            report.duplicates.len(),
            report.fresh.len()
        );
        Ok(Some(report))
    }
}
