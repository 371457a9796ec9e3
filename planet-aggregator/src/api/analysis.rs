use super::slug::path_slug;
use crate::aggregators::month_key;
use crate::types::Entry;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Title used for entries whose feed carries no title.
pub const UNKNOWN_SOURCE: &str = "Unknown";

pub struct SourceBucket<'a> {
    pub title: String,
    pub slug: String,
    pub entries: Vec<&'a Entry>,
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
}

pub struct TagBucket<'a> {
    /// First-seen casing.
    pub tag: String,
    pub slug: String,
    pub entries: Vec<&'a Entry>,
}

/// Every grouping the API views are derived from, computed in one pass so the
/// views cannot disagree with each other. Buckets keep input order.
pub struct Analysis<'a> {
    pub total_entries: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub by_month: BTreeMap<String, Vec<&'a Entry>>,
    /// Keyed by source title.
    pub by_source: BTreeMap<String, SourceBucket<'a>>,
    /// Keyed by lower-cased tag.
    pub by_tag: BTreeMap<String, TagBucket<'a>>,
}

pub fn source_title(entry: &Entry) -> &str {
    if entry.feed.title.is_empty() {
        UNKNOWN_SOURCE
    } else {
        &entry.feed.title
    }
}

impl<'a> Analysis<'a> {
    pub fn analyze(entries: &'a [Entry]) -> Self {
        let mut analysis = Analysis {
            total_entries: entries.len(),
            oldest: None,
            newest: None,
            by_month: BTreeMap::new(),
            by_source: BTreeMap::new(),
            by_tag: BTreeMap::new(),
        };

        for entry in entries {
            let published = entry.published;
            analysis.oldest = Some(analysis.oldest.map_or(published, |t| t.min(published)));
            analysis.newest = Some(analysis.newest.map_or(published, |t| t.max(published)));

            analysis
                .by_month
                .entry(month_key(&published))
                .or_default()
                .push(entry);

            let title = source_title(entry);
            let source = analysis
                .by_source
                .entry(title.to_string())
                .or_insert_with(|| SourceBucket {
                    title: title.to_string(),
                    slug: path_slug(title),
                    entries: Vec::new(),
                    oldest: published,
                    newest: published,
                });
            source.entries.push(entry);
            source.oldest = source.oldest.min(published);
            source.newest = source.newest.max(published);

            let mut seen = HashSet::new();
            for tag in &entry.tags {
                let lower = tag.to_lowercase();
                if !seen.insert(lower.clone()) {
                    continue;
                }
                analysis
                    .by_tag
                    .entry(lower)
                    .or_insert_with(|| TagBucket {
                        tag: tag.clone(),
                        slug: path_slug(tag),
                        entries: Vec::new(),
                    })
                    .entries
                    .push(entry);
            }
        }

        analysis
    }

    pub fn total_sources(&self) -> usize {
        self.by_source.len()
    }

    pub fn total_tags(&self) -> usize {
        self.by_tag.len()
    }
}

/// Listing order used by every index: count descending, then key ascending.
pub fn by_count_then_key(a_count: usize, a_key: &str, b_count: usize, b_key: &str) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_key.cmp(b_key))
}
