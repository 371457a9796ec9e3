use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defs::{Discussion, PlatformSource};

/// A hand-curated link that should rank above organically fetched content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityLink {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "content_html", default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    /// Lower ranks first.
    #[serde(default)]
    pub rank: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PlatformSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discussions: Vec<Discussion>,
}

/// A collection of priority links, optionally scoped to a period ("2026-02").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub links: Vec<PriorityLink>,
}

impl PriorityLinks {
    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        serde_json::from_str(data).context("priority links file is not valid JSON")
    }

    pub fn read_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read priority links {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_curated_links() {
        let links = PriorityLinks::from_json(
            r#"{
                "title": "Curated",
                "updated": "2026-02-01T00:00:00Z",
                "links": [{
                    "title": "Pinned",
                    "url": "http://y.com/p",
                    "rank": 1,
                    "content_html": "<p>body</p>",
                    "discussions": [{"platform": "hackernews", "url": "http://hn/123"}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(links.links.len(), 1);
        let link = &links.links[0];
        assert_eq!(link.rank, 1);
        assert_eq!(link.date, None);
        assert_eq!(link.content_html.as_deref(), Some("<p>body</p>"));
        assert_eq!(link.discussions[0].platform, "hackernews");
    }
}
