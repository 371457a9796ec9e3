use crate::types::{Discussion, Entry};
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Hex characters kept from the SHA-256 digest.
const ID_HEX_LEN: usize = 16;

/// Identity key for an entry URL: lower-cased, one trailing slash removed.
pub fn canonical_url(url: &str) -> String {
    let lower = url.to_lowercase();
    match lower.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Stable entry identifier over the original URL and the RFC3339 timestamp.
pub fn generate_id(url: &str, published: &DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(rfc3339(published).as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_HEX_LEN);
    id
}

pub fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Collapses entries sharing a canonical URL. The first occurrence keeps its
/// fields; later duplicates only contribute discussions and a priority flag.
pub fn deduplicate(entries: Vec<Entry>) -> Vec<Entry> {
    let total = entries.len();
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(total);
    let mut unique: Vec<Entry> = Vec::with_capacity(total);

    for mut entry in entries {
        let key = canonical_url(&entry.url);
        match seen.get(&key) {
            Some(&idx) => {
                let existing = &mut unique[idx];
                debug!("Merging duplicate entry: {} ({})", entry.title, entry.url);
                merge_discussions(&mut existing.discussions, entry.discussions);
                if entry.is_priority && !existing.is_priority {
                    existing.is_priority = true;
                    existing.priority_rank = entry.priority_rank;
                }
            }
            None => {
                let own = std::mem::take(&mut entry.discussions);
                merge_discussions(&mut entry.discussions, own);
                seen.insert(key, unique.len());
                unique.push(entry);
            }
        }
    }

    let removed = total - unique.len();
    if removed > 0 {
        info!("Removed {} duplicate entries", removed);
    }
    unique
}

/// Appends incoming discussions whose URL is not present yet.
pub fn merge_discussions(existing: &mut Vec<Discussion>, incoming: Vec<Discussion>) {
    let mut seen: HashSet<String> = existing.iter().map(|d| d.url.clone()).collect();
    for discussion in incoming {
        if seen.insert(discussion.url.clone()) {
            existing.push(discussion);
        }
    }
}

/// Newest first. `sort_by` is stable, so ties keep their relative order.
pub fn sort_by_date(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
}
