use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
// Boundary records come from the interfaces crate
pub use interfaces::defs::{Discussion, PlatformSource, SourceDescriptor};

/// Metadata about the feed an entry was pulled from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMeta {
    pub title: String,
    pub url: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published: DateTime<Utc>,
    pub feed: FeedMeta,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub source: Option<PlatformSource>,
    pub is_priority: bool,
    /// Only meaningful when `is_priority` is set.
    pub priority_rank: i64,
    pub discussions: Vec<Discussion>,
}

impl Entry {
    /// Minimal entry with a derived identifier; everything else empty.
    pub fn new(title: impl Into<String>, url: impl Into<String>, published: DateTime<Utc>) -> Self {
        let url = url.into();
        Self {
            id: crate::dedup::generate_id(&url, &published),
            title: title.into(),
            url,
            author: None,
            published,
            feed: FeedMeta::default(),
            tags: Vec::new(),
            summary: None,
            content: None,
            image: None,
            image_alt: None,
            source: None,
            is_priority: false,
            priority_rank: 0,
            discussions: Vec::new(),
        }
    }
}

/// An ordered, deduplicated set of entries plus collection metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub generated: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub home_url: Option<String>,
    pub entries: Vec<Entry>,
}

impl Feed {
    pub fn new(title: impl Into<String>, generated: DateTime<Utc>) -> Self {
        Self {
            generated,
            title: title.into(),
            description: None,
            home_url: None,
            entries: Vec::new(),
        }
    }

    /// Same metadata, different entries.
    pub fn with_entries(&self, entries: Vec<Entry>) -> Self {
        Self {
            generated: self.generated,
            title: self.title.clone(),
            description: self.description.clone(),
            home_url: self.home_url.clone(),
            entries,
        }
    }

    pub fn add_entry(&mut self, mut entry: Entry) {
        if entry.id.is_empty() {
            entry.id = crate::dedup::generate_id(&entry.url, &entry.published);
        }
        self.entries.push(entry);
    }

    /// Newest first; ties keep insertion order.
    pub fn sort_by_date(&mut self) {
        crate::dedup::sort_by_date(&mut self.entries);
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Entries kept per source, in the source's own order. 0 keeps all.
    pub max_entries: usize,
    /// Entries older than this are dropped silently.
    pub max_age: Option<Duration>,
    /// Allow-list of tags; empty keeps everything.
    pub filter_tags: Vec<String>,
    pub concurrency: usize,
    pub max_redirects: usize,
    /// Deadline for the whole aggregation, not for a single fetch.
    pub deadline_seconds: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("planet-aggregator/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
            max_entries: 50,
            max_age: None,
            filter_tags: Vec::new(),
            concurrency: 10,
            max_redirects: 5,
            deadline_seconds: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No feed URL for source: {title}")]
    MissingFeedUrl { title: String },

    #[error("Timed out after {seconds}s fetching {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("General error: {0}")]
    General(String),
}

/// A fetch failure tied to the source it came from. Collected, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("{feed_title} ({feed_url}): {error}")]
pub struct SourceError {
    pub feed_title: String,
    pub feed_url: String,
    pub error: AggregatorError,
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
