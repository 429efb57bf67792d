//! A cached copy of the wiki, searched by `/search`, and of the list of lists sampled by
//! `/list`. The duplicate link check reads the same copy.

use std::{
    collections::HashSet,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{seq::SliceRandom, Rng};
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    config,
    links::{extract_links, Link},
    Result,
};

/// Entries shown for one search.
pub const MAX_RESULTS: usize = 5;
/// Links `/list` shows at most.
pub const MAX_LIST_LINKS: usize = 25;
/// Past this many matches only lines holding every query word whole are kept.
const BROAD_MATCHES: usize = 300;
/// Characters of one entry shown in the results embed.
const MAX_ENTRY_LEN: usize = 600;

struct Snapshot<T> {
    value:   Arc<T>,
    fetched: Instant,
}

/// A downloaded page, parsed once per download and reused until it is `refresh` old.
pub struct Mirror<T> {
    url:     String,
    refresh: Duration,
    parse:   fn(&str) -> T,
    cache:   RwLock<Option<Snapshot<T>>>,
}

impl<T> Mirror<T> {
    pub fn new(url: impl Into<String>, refresh: Duration, parse: fn(&str) -> T) -> Self {
        Self {
            url: url.into(),
            refresh,
            parse,
            cache: RwLock::new(None),
        }
    }

    fn fresh(&self, snapshot: &Option<Snapshot<T>>) -> Option<Arc<T>> {
        snapshot
            .as_ref()
            .filter(|snapshot| snapshot.fetched.elapsed() < self.refresh)
            .map(|snapshot| snapshot.value.clone())
    }

    pub async fn get(&self, client: &reqwest::Client) -> Result<Arc<T>> {
        if let Some(value) = self.fresh(&*self.cache.read().await) {
            return Ok(value);
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed it while we waited.
        if let Some(value) = self.fresh(&cache) {
            return Ok(value);
        }

        let page = client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let value = Arc::new((self.parse)(&page));
        info!("Refreshed the cached copy of {}", self.url);

        *cache = Some(Snapshot {
            value:   value.clone(),
            fetched: Instant::now(),
        });
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) async fn preload(&self, page: &str, age: Duration) {
        *self.cache.write().await = Some(Snapshot {
            value:   Arc::new((self.parse)(page)),
            fetched: Instant::now() - age,
        });
    }
}

/// One listed line of the wiki and the section it sits in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// `Category / Subcategory`, empty above the first heading.
    pub section: String,
    pub text:    String,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.section.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "[{}] ► {}", self.section, self.text)
        }
    }
}

#[derive(Debug, Default)]
pub struct WikiIndex {
    pub entries: Vec<Entry>,
    pub links:   HashSet<Link>,
}

impl WikiIndex {
    /// Splits the single page wiki into entries under their `#` and `##` headings.
    pub fn parse(page: &str) -> Self {
        let mut category = String::new();
        let mut subcategory = String::new();
        let mut entries = Vec::new();

        for line in page.lines().map(str::trim) {
            if line.starts_with('#') {
                let level = line.chars().take_while(|&c| c == '#').count();
                let title = line
                    .trim_start_matches('#')
                    .trim()
                    .trim_start_matches(&['►', '▷'][..])
                    .trim();
                // Headings that are links read badly as a section name.
                let title = if title.contains("http") { "" } else { title };
                match level {
                    1 => {
                        category = title.to_string();
                        subcategory.clear();
                    }
                    2 => subcategory = title.to_string(),
                    _ => (),
                }
            } else if line.chars().any(char::is_alphabetic) {
                let section = [category.as_str(), subcategory.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" / ");
                entries.push(Entry {
                    section,
                    text: line.strip_prefix("* ").unwrap_or(line).to_string(),
                });
            }
        }

        Self {
            entries,
            links: extract_links(page).into_iter().collect(),
        }
    }
}

fn query_words(query: &str) -> Vec<String> { query.split_whitespace().map(str::to_lowercase).collect() }

/// Every query word appears as a whole word of the entry.
fn whole_word_match(entry: &Entry, words: &[String]) -> bool {
    let haystack = entry.to_string().to_lowercase().replace(&['[', ']'][..], " ");
    let line_words = haystack.split_whitespace().collect::<HashSet<_>>();
    words.iter().all(|word| line_words.contains(word.as_str()))
}

/// Every query word appears somewhere in the entry.
fn substring_match(entry: &Entry, words: &[String]) -> bool {
    let haystack = entry.to_string().to_lowercase();
    words.iter().all(|word| haystack.contains(word.as_str()))
}

/// Very short queries and acronyms only match whole words.
fn is_strict(query: &str) -> bool {
    let query = query.trim();
    let len = query.chars().count();
    len <= 2 || (len <= 5 && query == query.to_uppercase())
}

/// The best [`MAX_RESULTS`] entries for `query`. Whole word matches come first and
/// NSFW entries are never returned.
pub fn search<'a>(entries: &'a [Entry], query: &str) -> Vec<&'a Entry> {
    let words = query_words(query);
    if words.is_empty() {
        return Vec::new();
    }

    let strict = is_strict(query);
    let mut matches = entries
        .iter()
        .filter(|entry| !entry.to_string().to_lowercase().contains("nsfw"))
        .filter(|entry| {
            if strict {
                whole_word_match(entry, &words)
            } else {
                substring_match(entry, &words)
            }
        })
        .collect::<Vec<_>>();

    if matches.len() > BROAD_MATCHES {
        matches.retain(|entry| whole_word_match(entry, &words));
    }

    let (mut ranked, rest): (Vec<_>, Vec<_>) = matches
        .into_iter()
        .partition(|entry| whole_word_match(entry, &words));
    ranked.extend(rest);
    ranked.truncate(MAX_RESULTS);
    ranked
}

/// Numbered results for an embed description.
pub fn format_results(results: &[&Entry]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("**{}** - {}", i + 1, shorten(&entry.to_string(), MAX_ENTRY_LEN)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    format!("{}…", text.chars().take(max).collect::<String>())
}

/// Distinct links of the list of lists, in a stable order.
pub fn list_links(page: &str) -> Vec<Link> { extract_links(page).into_iter().collect() }

/// The number of links to show for a requested `count`.
pub fn list_count(count: i64) -> usize { count.clamp(1, MAX_LIST_LINKS as i64) as usize }

/// `count` distinct links, or all of them when there are fewer.
pub fn sample<'a, R: Rng + ?Sized>(links: &'a [Link], count: usize, rng: &mut R) -> Vec<&'a Link> {
    links.choose_multiple(rng, count).collect()
}

pub struct Wiki {
    client:      reqwest::Client,
    pages:       Mirror<WikiIndex>,
    lists:       Mirror<Vec<Link>>,
    list_source: String,
}

impl Wiki {
    pub fn new(settings: &config::wiki::Wiki) -> Self {
        Self {
            client:      reqwest::Client::new(),
            pages:       Mirror::new(&settings.url, settings.refresh_interval(), WikiIndex::parse),
            lists:       Mirror::new(&settings.list_url, settings.refresh_interval(), list_links),
            list_source: settings.list_url.trim_end_matches("/raw").to_string(),
        }
    }

    pub async fn index(&self) -> Result<Arc<WikiIndex>> { self.pages.get(&self.client).await }

    pub async fn list_of_lists(&self) -> Result<Arc<Vec<Link>>> { self.lists.get(&self.client).await }

    /// The human readable address of the list of lists.
    pub fn list_source(&self) -> &str { &self.list_source }

    #[cfg(test)]
    pub(crate) async fn preload(&self, page: &str, lists: &str, age: Duration) {
        self.pages.preload(page, age).await;
        self.lists.preload(lists, age).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    pub(crate) fn offline(refresh_interval: u64) -> Wiki {
        Wiki::new(&config::wiki::Wiki {
            url: "http://127.0.0.1:9/unreachable".to_string(),
            list_url: "http://127.0.0.1:9/lists/raw".to_string(),
            refresh_interval,
        })
    }

    const PAGE: &str = "\
Intro text
# ► Video
## ▷ Streaming Sites
* [Movie Web](https://movie-web.app) - Movies and TV
* [Cineb](https://cineb.rs) - Movies, TV, anime.
## ▷ Anime Streaming
* [HiAnime](https://hianime.to) - Subbed anime
# ► Tools
## ▷ [Mirror](https://example.com)
* [VLC](https://videolan.org) - Media player, plays TV streams
# ► NSFW
* [Adult](https://nsfw.example) - Movies
";

    fn entry(section: &str, text: &str) -> Entry {
        Entry {
            section: section.to_string(),
            text:    text.to_string(),
        }
    }

    #[test]
    fn entries_carry_their_section() {
        let index = WikiIndex::parse(PAGE);
        assert_eq!(index.entries[0], entry("", "Intro text"));
        assert_eq!(
            index.entries[1],
            entry("Video / Streaming Sites", "[Movie Web](https://movie-web.app) - Movies and TV")
        );
        assert_eq!(index.entries[3].section, "Video / Anime Streaming");
        assert_eq!(index.entries[4].section, "Tools");
        assert_eq!(index.entries.len(), 6);
        assert!(index.links.contains(&Link {
            scheme: "https".to_string(),
            rest:   "videolan.org".to_string(),
        }));
    }

    #[test]
    fn every_word_must_appear_and_whole_words_rank_first() {
        let index = WikiIndex::parse(PAGE);
        let results = search(&index.entries, "movies tv");
        let texts = results.iter().map(|entry| entry.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, [
            "[Movie Web](https://movie-web.app) - Movies and TV",
            "[Cineb](https://cineb.rs) - Movies, TV, anime.",
        ]);

        // "anime" is a whole word of the "Anime Streaming" section but not of "anime.".
        let results = search(&index.entries, "anime");
        assert_eq!(results[0].text, "[HiAnime](https://hianime.to) - Subbed anime");
        assert_eq!(results.len(), 2);

        assert!(search(&index.entries, "   ").is_empty());
        assert!(search(&index.entries, "nothing matches this").is_empty());
    }

    #[test]
    fn short_queries_and_acronyms_need_whole_words() {
        let entries = [entry("Tools", "VLC player"), entry("Tools", "Unvlcish thing")];
        assert!(is_strict("tv"));
        assert!(is_strict("VLC"));
        assert!(!is_strict("vlc"));

        let results = search(&entries, "VLC");
        assert_eq!(results, [&entries[0]]);
        assert_eq!(search(&entries, "vlc").len(), 2);
    }

    #[test]
    fn nsfw_entries_are_hidden_and_results_capped() {
        let index = WikiIndex::parse(PAGE);
        assert!(search(&index.entries, "adult").is_empty());

        let many = (0..20).map(|i| entry("Tools", &format!("Tool {i} editor"))).collect::<Vec<_>>();
        let results = search(&many, "editor");
        assert_eq!(results.len(), MAX_RESULTS);
        assert_eq!(results[0].text, "Tool 0 editor");
    }

    #[test]
    fn broad_queries_fall_back_to_whole_words() {
        let mut entries = (0..BROAD_MATCHES)
            .map(|i| entry("", &format!("Editors {i}")))
            .collect::<Vec<_>>();
        entries.push(entry("", "Image editor"));
        let results = search(&entries, "editor");
        assert_eq!(results, [entries.last().unwrap()]);
    }

    #[test]
    fn results_are_numbered_and_shortened() {
        let long = entry("Tools", &"x".repeat(MAX_ENTRY_LEN * 2));
        let short = entry("", "VLC");
        let text = format_results(&[&short, &long]);
        assert!(text.starts_with("**1** - VLC\n\n**2** - [Tools] ► xxx"));
        assert!(text.ends_with('…'));
        assert!(text.chars().count() < MAX_ENTRY_LEN + 30);
    }

    #[test]
    fn list_counts_are_clamped() {
        assert_eq!(list_count(-3), 1);
        assert_eq!(list_count(0), 1);
        assert_eq!(list_count(7), 7);
        assert_eq!(list_count(100), MAX_LIST_LINKS);
    }

    #[test]
    fn samples_are_distinct_links() {
        let links = list_links("https://a.com https://b.com https://a.com http://c.org/x");
        assert_eq!(links.len(), 3);

        let mut rng = StdRng::seed_from_u64(4);
        let picked = sample(&links, 2, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
        assert_eq!(sample(&links, 10, &mut rng).len(), 3);
    }

    #[tokio::test]
    async fn fresh_copies_answer_without_downloading() {
        let wiki = offline(300);
        wiki.preload(PAGE, "https://a.com https://b.com", Duration::from_secs(1))
            .await;

        assert_eq!(wiki.index().await.unwrap().entries.len(), 6);
        assert_eq!(wiki.list_of_lists().await.unwrap().len(), 2);
        assert_eq!(wiki.list_source(), "http://127.0.0.1:9/lists");
    }

    #[tokio::test]
    async fn stale_copies_are_downloaded_again() {
        let wiki = offline(0);
        wiki.preload(PAGE, "", Duration::ZERO).await;
        assert!(wiki.index().await.is_err());
    }
}
