use serde::{Deserialize, Serialize};

/// One remote feed the aggregator pulls entries from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Feed document URL. May be empty when the list names a feed without one.
    pub url: String,
    pub title: String,
    pub description: String,
    /// Site home page, used when the feed itself does not advertise one.
    pub html_url: String,
    pub categories: Vec<String>,
}

/// A link to a discussion thread about an entry (Hacker News, Reddit, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub platform: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub score: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub comments: u64,
}

impl Discussion {
    pub fn new(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
            id: None,
            score: 0,
            comments: 0,
        }
    }
}

/// Where a curated entry was originally posted (linkedin, mastodon, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSource {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "postId", default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}
