use crate::types::{Entry, Feed};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// "2026-02"
pub fn month_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m").to_string()
}

pub fn monthly_file_name(prefix: &str, month: &str) -> String {
    format!("{prefix}-{month}.json")
}

/// Buckets entries by publication month. Each bucket keeps the feed's
/// metadata and the entries in their existing order.
pub fn split_by_month(feed: &Feed) -> BTreeMap<String, Feed> {
    let mut entries_by_month: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for entry in &feed.entries {
        entries_by_month
            .entry(month_key(&entry.published))
            .or_default()
            .push(entry.clone());
    }

    entries_by_month
        .into_iter()
        .map(|(month, entries)| (month, feed.with_entries(entries)))
        .collect()
}

pub struct MonthlyPartition {
    /// Ascending by month key.
    pub buckets: BTreeMap<String, Feed>,
    /// Entries from the most recent months only.
    pub latest: Feed,
}

/// Splits a sorted, deduplicated feed into monthly buckets and a bounded
/// "latest" window.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyPartitioner {
    /// The window covers the N most recent months that have entries. Zero or
    /// negative covers everything.
    latest_months: i32,
}

impl MonthlyPartitioner {
    pub fn new(latest_months: i32) -> Self {
        Self { latest_months }
    }

    pub fn partition(&self, feed: &Feed) -> MonthlyPartition {
        let buckets = split_by_month(feed);
        let latest = self.latest(feed);
        debug!(
            months = buckets.len(),
            latest_entries = latest.entries.len(),
            "Partitioned {} entries by month",
            feed.entries.len()
        );
        MonthlyPartition { buckets, latest }
    }

    /// Entries whose month is among the window's months, in feed order.
    pub fn latest(&self, feed: &Feed) -> Feed {
        let months: BTreeSet<String> = feed
            .entries
            .iter()
            .map(|entry| month_key(&entry.published))
            .collect();

        let window: BTreeSet<String> = if self.latest_months > 0 {
            months
                .into_iter()
                .rev()
                .take(self.latest_months as usize)
                .collect()
        } else {
            months
        };

        let entries = feed
            .entries
            .iter()
            .filter(|entry| window.contains(&month_key(&entry.published)))
            .cloned()
            .collect();
        feed.with_entries(entries)
    }
}

/// Root `index.json`: month to file to count, newest month first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIndex {
    pub generated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub files: Vec<MonthlyFileRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFileRef {
    pub month: String,
    pub filename: String,
    pub count: usize,
}

impl MonthlyIndex {
    pub fn build(
        partition: &MonthlyPartition,
        prefix: &str,
        title: &str,
        generated: DateTime<Utc>,
    ) -> Self {
        let files = partition
            .buckets
            .iter()
            .rev()
            .map(|(month, bucket)| MonthlyFileRef {
                month: month.clone(),
                filename: monthly_file_name(prefix, month),
                count: bucket.entries.len(),
            })
            .collect();

        Self {
            generated,
            title: title.to_string(),
            files,
        }
    }
}
