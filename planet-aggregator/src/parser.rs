use crate::types::{AggregatorError, Entry, FeedMeta, FetchConfig, Result, SourceDescriptor};
use crate::utils::{tags, text, url};
use chrono::{DateTime, Duration, Timelike, Utc};
use feed_rs::parser;
use tracing::debug;

/// Summaries derived from content are cut to about this many characters.
const SUMMARY_CHARS: usize = 500;

/// Turns a fetched feed document into normalized entries for one source.
pub struct FeedParser {
    max_entries: usize,
    max_age: Option<Duration>,
}

impl FeedParser {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            max_age: config.max_age,
        }
    }

    /// Parses `body` (RSS, Atom or JSON Feed). `now` is the date given to
    /// items that carry neither a published nor an updated date, and the
    /// reference point for the age limit.
    pub fn parse_source(
        &self,
        source: &SourceDescriptor,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<Entry>> {
        debug!("Parsing feed content ({} bytes) for {}", body.len(), source.url);

        let feed = parser::parse(body)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse {}: {}", source.url, e)))?;

        let meta = feed_meta(&feed, source);
        let cutoff = self.max_age.map(|age| now - age);
        let limit = if self.max_entries == 0 {
            usize::MAX
        } else {
            self.max_entries
        };

        let mut entries = Vec::new();
        for item in feed.entries.into_iter().take(limit) {
            let Some(entry) = convert_entry(item, source, &meta, now) else {
                continue;
            };
            if let Some(cutoff) = cutoff {
                if entry.published < cutoff {
                    debug!("Dropping entry older than max age: {}", entry.url);
                    continue;
                }
            }
            entries.push(entry);
        }

        debug!("Parsed {} entries from {}", entries.len(), source.url);
        Ok(entries)
    }
}

fn feed_meta(feed: &feed_rs::model::Feed, source: &SourceDescriptor) -> FeedMeta {
    let title = text::non_empty(feed.title.as_ref().map(|t| t.content.clone()))
        .unwrap_or_else(|| source.title.clone());
    let home = feed
        .links
        .iter()
        .find(|link| link.rel.as_deref() != Some("self"))
        .map(|link| link.href.clone());
    let url = text::non_empty(home).unwrap_or_else(|| source.html_url.clone());
    let icon_url = feed
        .icon
        .as_ref()
        .or(feed.logo.as_ref())
        .map(|image| image.uri.clone());

    FeedMeta {
        title,
        url,
        icon_url,
    }
}

fn convert_entry(
    item: feed_rs::model::Entry,
    source: &SourceDescriptor,
    meta: &FeedMeta,
    now: DateTime<Utc>,
) -> Option<Entry> {
    let link = item
        .links
        .iter()
        .find(|link| link.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| item.links.first())?;
    let entry_url = url::resolve(&source.url, &link.href);

    let published = whole_seconds(item.published.or(item.updated).unwrap_or(now));

    let item_tags: Vec<String> = item
        .categories
        .iter()
        .map(|c| {
            if c.term.trim().is_empty() {
                c.label.clone().unwrap_or_default()
            } else {
                c.term.clone()
            }
        })
        .collect();
    let tags = tags::unique_tags(source.categories.iter().chain(item_tags.iter()));

    let content = text::non_empty(item.content.and_then(|c| c.body));
    let summary = text::non_empty(item.summary.map(|s| s.content))
        .or_else(|| content.as_deref().map(|c| text::truncate_summary(c, SUMMARY_CHARS)));

    let image = item
        .media
        .iter()
        .flat_map(|media| media.thumbnails.iter())
        .map(|thumbnail| thumbnail.image.uri.clone())
        .next();

    let mut entry = Entry::new(
        text::non_empty(item.title.map(|t| t.content)).unwrap_or_else(|| "Untitled".to_string()),
        entry_url,
        published,
    );
    entry.author = text::non_empty(item.authors.first().map(|a| a.name.clone()));
    entry.feed = meta.clone();
    entry.tags = tags;
    entry.summary = summary;
    entry.content = content;
    entry.image = image;
    Some(entry)
}

/// RFC3339 output carries whole seconds; trimming here keeps a re-read
/// archive identical to a fresh fetch.
fn whole_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
