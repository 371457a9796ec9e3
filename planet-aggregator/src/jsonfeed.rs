//! JSON Feed 1.1 documents with `_planet_*` extensions.
//!
//! Every output feed file is written through [`JsonFeed`], and archived
//! monthly files are read back through it, so the projection must stay
//! lossless for every [`Entry`] field.

use crate::dedup::{generate_id, rfc3339};
use crate::types::{AggregatorError, Discussion, Entry, Feed, FeedMeta, PlatformSource, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFeed {
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
    #[serde(rename = "_planet_generated", default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    /// "2026-02" for monthly archives.
    #[serde(rename = "_planet_period", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonFeedItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(rename = "_planet_feed_title", default, skip_serializing_if = "Option::is_none")]
    pub feed_title: Option<String>,
    #[serde(rename = "_planet_feed_url", default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(rename = "_planet_feed_icon", default, skip_serializing_if = "Option::is_none")]
    pub feed_icon: Option<String>,
    #[serde(rename = "_planet_image_alt", default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(rename = "_planet_priority", default, skip_serializing_if = "is_false")]
    pub priority: bool,
    #[serde(rename = "_planet_rank", default, skip_serializing_if = "is_zero")]
    pub rank: i64,
    #[serde(rename = "_planet_discussions", default, skip_serializing_if = "Vec::is_empty")]
    pub discussions: Vec<Discussion>,
    #[serde(rename = "_planet_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PlatformSource>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl JsonFeed {
    pub fn from_feed(feed: &Feed, period: Option<&str>) -> Self {
        Self {
            version: VERSION.to_string(),
            title: feed.title.clone(),
            home_page_url: feed.home_url.clone(),
            description: feed.description.clone(),
            items: feed.entries.iter().map(JsonFeedItem::from).collect(),
            generated: Some(rfc3339(&feed.generated)),
            period: period.map(str::to_string),
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub async fn read_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Self::from_slice(&data)
    }

    /// Pretty-printed, two-space indent.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

impl From<&Entry> for JsonFeedItem {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            url: non_empty(&entry.url),
            title: non_empty(&entry.title),
            content_html: entry.content.clone(),
            summary: entry.summary.clone(),
            image: entry.image.clone(),
            date_published: Some(rfc3339(&entry.published)),
            authors: entry
                .author
                .iter()
                .map(|name| Author {
                    name: Some(name.clone()),
                    url: None,
                })
                .collect(),
            tags: entry.tags.clone(),
            feed_title: non_empty(&entry.feed.title),
            feed_url: non_empty(&entry.feed.url),
            feed_icon: entry.feed.icon_url.clone(),
            image_alt: entry.image_alt.clone(),
            priority: entry.is_priority,
            rank: if entry.is_priority { entry.priority_rank } else { 0 },
            discussions: entry.discussions.clone(),
            source: entry.source.clone(),
        }
    }
}

impl TryFrom<JsonFeedItem> for Entry {
    type Error = AggregatorError;

    /// Items without a URL or a parseable publish date cannot be identified
    /// and are rejected.
    fn try_from(item: JsonFeedItem) -> Result<Self> {
        let url = item
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AggregatorError::Parse(format!("item {} has no url", item.id)))?;
        let raw_date = item
            .date_published
            .ok_or_else(|| AggregatorError::Parse(format!("item {} has no date", item.id)))?;
        let published = DateTime::parse_from_rfc3339(&raw_date)
            .map_err(|e| AggregatorError::Parse(format!("bad date {raw_date:?}: {e}")))?
            .with_timezone(&Utc);

        let id = if item.id.is_empty() {
            generate_id(&url, &published)
        } else {
            item.id
        };

        Ok(Entry {
            id,
            title: item.title.unwrap_or_default(),
            url,
            author: item.authors.into_iter().find_map(|a| a.name),
            published,
            feed: FeedMeta {
                title: item.feed_title.unwrap_or_default(),
                url: item.feed_url.unwrap_or_default(),
                icon_url: item.feed_icon,
            },
            tags: item.tags,
            summary: item.summary,
            content: item.content_html,
            image: item.image,
            image_alt: item.image_alt,
            source: item.source,
            is_priority: item.priority,
            priority_rank: item.rank,
            discussions: item.discussions,
        })
    }
}
