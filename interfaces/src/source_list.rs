use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::defs::SourceDescriptor;

/// An OPML document kept as JSON. Outlines nest for grouping; only the ones
/// that describe a feed become sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub outlines: Vec<Outline>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub xml_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outlines: Vec<Outline>,
}

impl Outline {
    /// A feed outline either carries a feed URL or is a leaf explicitly typed
    /// as a feed. The latter is kept so the missing URL gets reported.
    fn is_feed(&self) -> bool {
        !self.xml_url.is_empty()
            || (self.outlines.is_empty() && matches!(self.kind.as_str(), "rss" | "atom"))
    }

    fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.text
        } else {
            &self.title
        }
    }
}

impl SourceList {
    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        serde_json::from_str(data).context("source list is not valid OPML JSON")
    }

    pub fn read_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read source list {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Flattens nested outlines into feed descriptors, in document order.
    pub fn sources(&self) -> Vec<SourceDescriptor> {
        let mut sources = Vec::new();
        collect_feeds(&self.outlines, &mut sources);
        sources
    }
}

fn collect_feeds(outlines: &[Outline], sources: &mut Vec<SourceDescriptor>) {
    for outline in outlines {
        if outline.is_feed() {
            sources.push(SourceDescriptor {
                url: outline.xml_url.clone(),
                title: outline.display_title().to_string(),
                description: outline.description.clone(),
                html_url: outline.html_url.clone(),
                categories: outline.categories.clone(),
            });
        }
        collect_feeds(&outline.outlines, sources);
    }
}
