use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `meta/about.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    pub generated: DateTime<Utc>,
    pub generator: Generator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub version: String,
}

impl Generator {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `meta/sources.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesMeta {
    pub generated: DateTime<Utc>,
    pub count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub entry_count: usize,
    pub latest_entry: DateTime<Utc>,
    pub oldest_entry: DateTime<Utc>,
    pub path: String,
}

/// `meta/stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsMeta {
    pub generated: DateTime<Utc>,
    pub total_entries: usize,
    pub total_sources: usize,
    pub total_tags: usize,
    pub date_range: DateRange,
    pub entries_by_month: Vec<MonthCount>,
    pub entries_by_source: Vec<SourceCount>,
    pub top_tags: Vec<TagCount>,
}

/// Both ends are absent when there are no entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCount {
    pub slug: String,
    pub title: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub slug: String,
    pub count: usize,
}

/// `by-month/index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthIndex {
    pub generated: DateTime<Utc>,
    pub count: usize,
    pub months: Vec<MonthRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRef {
    pub month: String,
    pub count: usize,
    pub path: String,
}

/// `by-source/index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceIndex {
    pub generated: DateTime<Utc>,
    pub count: usize,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub slug: String,
    pub title: String,
    pub count: usize,
    pub path: String,
}

/// `by-tag/index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagIndex {
    pub generated: DateTime<Utc>,
    pub count: usize,
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    pub tag: String,
    pub slug: String,
    pub count: usize,
    pub path: String,
}
