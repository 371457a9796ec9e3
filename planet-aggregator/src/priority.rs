use crate::types::{Entry, FeedMeta};
use chrono::{DateTime, Timelike, Utc};
use interfaces::priority::{PriorityLink, PriorityLinks};

/// Converts curated links into priority entries. Links without a date take
/// the document's `updated` stamp.
pub fn priority_entries(links: &PriorityLinks) -> Vec<Entry> {
    links
        .links
        .iter()
        .map(|link| priority_entry(link, links.updated))
        .collect()
}

fn priority_entry(link: &PriorityLink, fallback: DateTime<Utc>) -> Entry {
    let published = link.date.unwrap_or(fallback);
    let published = published.with_nanosecond(0).unwrap_or(published);

    let mut entry = Entry::new(link.title.clone(), link.url.clone(), published);
    entry.author = link.author.clone();
    entry.feed = FeedMeta {
        title: link.feed_title.clone().unwrap_or_default(),
        url: link.feed_url.clone().unwrap_or_default(),
        icon_url: None,
    };
    entry.tags = crate::utils::tags::unique_tags(&link.tags);
    entry.summary = link.summary.clone();
    entry.content = link.content_html.clone();
    entry.image = link.image.clone();
    entry.image_alt = link.image_alt.clone();
    entry.source = link.source.clone();
    entry.is_priority = true;
    entry.priority_rank = link.rank;
    entry.discussions = link.discussions.clone();
    entry
}
