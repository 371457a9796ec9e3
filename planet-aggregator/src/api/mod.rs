//! File-based API: every view is derived from one entry set and planned in
//! memory, so counts and listings agree across files.

pub mod analysis;
pub mod models;
pub mod schema;
pub mod slug;

use crate::jsonfeed::JsonFeed;
use crate::output::OutputTree;
use crate::types::{Entry, Feed, Result, SourceDescriptor};
use analysis::{by_count_then_key, Analysis};
use models::*;
use std::collections::HashMap;
use tracing::info;

pub const DEFAULT_VERSION: &str = "v1";

/// Tags listed in `stats.json`.
const TOP_TAGS: usize = 20;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enabled: bool,
    /// Directory under the output root, e.g. "v1".
    pub version: String,
    pub planet_name: String,
    pub planet_description: Option<String>,
    pub planet_url: Option<String>,
    pub owner_name: Option<String>,
    pub owner_url: Option<String>,
    /// Also write `feeds/all.json` with every entry.
    pub generate_all: bool,
    pub generate_schema: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version: DEFAULT_VERSION.to_string(),
            planet_name: "Planet".to_string(),
            planet_description: None,
            planet_url: None,
            owner_name: None,
            owner_url: None,
            generate_all: false,
            generate_schema: true,
        }
    }
}

pub struct Materializer {
    config: ApiConfig,
}

impl Materializer {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// Plans the whole `{version}/` tree for `feed`. `latest` is the latest
    /// window already cut by the monthly partitioner; `sources` supplies the
    /// descriptive fields of `meta/sources.json`.
    pub fn plan(
        &self,
        feed: &Feed,
        latest: &Feed,
        sources: &[SourceDescriptor],
        tree: &mut OutputTree,
    ) -> Result<()> {
        let analysis = Analysis::analyze(&feed.entries);
        let before = tree.len();

        self.plan_meta(feed, &analysis, sources, tree)?;

        let mut latest_feed = JsonFeed::from_feed(latest, None);
        latest_feed.title = self.config.planet_name.clone();
        tree.add(self.file("feeds/latest.json"), latest_feed.to_bytes()?);
        if self.config.generate_all {
            let mut all_feed = JsonFeed::from_feed(feed, None);
            all_feed.title = self.config.planet_name.clone();
            tree.add(self.file("feeds/all.json"), all_feed.to_bytes()?);
        }

        self.plan_by_month(feed, &analysis, tree)?;
        self.plan_by_source(feed, &analysis, tree)?;
        self.plan_by_tag(feed, &analysis, tree)?;

        if self.config.generate_schema {
            tree.add_json(
                self.file("schema.json"),
                &schema::api_schema(&self.config.planet_name),
            )?;
        }

        info!(
            files = tree.len() - before,
            sources = analysis.total_sources(),
            tags = analysis.total_tags(),
            "Planned API tree under {}",
            self.config.version
        );
        Ok(())
    }

    /// Path relative to the output root.
    fn file(&self, relative: &str) -> String {
        format!("{}/{}", self.config.version, relative)
    }

    /// Path as referenced from index files.
    fn link(&self, relative: &str) -> String {
        format!("/{}/{}", self.config.version, relative)
    }

    fn plan_meta(
        &self,
        feed: &Feed,
        analysis: &Analysis<'_>,
        sources: &[SourceDescriptor],
        tree: &mut OutputTree,
    ) -> Result<()> {
        let about = AboutMeta {
            name: self.config.planet_name.clone(),
            description: self.config.planet_description.clone(),
            home_url: self.config.planet_url.clone(),
            feed_url: self.config.planet_url.as_ref().map(|home| {
                format!(
                    "{}{}",
                    home.trim_end_matches('/'),
                    self.link("feeds/latest.json")
                )
            }),
            owner: self.config.owner_name.as_ref().map(|name| Owner {
                name: name.clone(),
                url: self.config.owner_url.clone(),
            }),
            generated: feed.generated,
            generator: Generator::current(),
        };
        tree.add_json(self.file("meta/about.json"), &about)?;

        let descriptors: HashMap<&str, &SourceDescriptor> =
            sources.iter().map(|s| (s.title.as_str(), s)).collect();
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        let mut source_entries: Vec<SourceEntry> = analysis
            .by_source
            .values()
            .map(|bucket| {
                let descriptor = descriptors.get(bucket.title.as_str());
                SourceEntry {
                    slug: bucket.slug.clone(),
                    title: bucket.title.clone(),
                    description: descriptor.and_then(|d| non_empty(&d.description)),
                    html_url: descriptor.and_then(|d| non_empty(&d.html_url)),
                    feed_url: descriptor.and_then(|d| non_empty(&d.url)),
                    categories: descriptor.map(|d| d.categories.clone()).unwrap_or_default(),
                    entry_count: bucket.entries.len(),
                    latest_entry: bucket.newest,
                    oldest_entry: bucket.oldest,
                    path: self.link(&format!("by-source/{}.json", bucket.slug)),
                }
            })
            .collect();
        source_entries.sort_by(|a, b| {
            by_count_then_key(a.entry_count, &a.slug, b.entry_count, &b.slug)
        });
        tree.add_json(
            self.file("meta/sources.json"),
            &SourcesMeta {
                generated: feed.generated,
                count: source_entries.len(),
                sources: source_entries,
            },
        )?;

        let mut entries_by_month: Vec<MonthCount> = analysis
            .by_month
            .iter()
            .map(|(month, entries)| MonthCount {
                month: month.clone(),
                count: entries.len(),
            })
            .collect();
        entries_by_month.sort_by(|a, b| by_count_then_key(a.count, &a.month, b.count, &b.month));

        let mut entries_by_source: Vec<SourceCount> = analysis
            .by_source
            .values()
            .map(|bucket| SourceCount {
                slug: bucket.slug.clone(),
                title: bucket.title.clone(),
                count: bucket.entries.len(),
            })
            .collect();
        entries_by_source.sort_by(|a, b| by_count_then_key(a.count, &a.slug, b.count, &b.slug));

        let mut top_tags: Vec<TagCount> = analysis
            .by_tag
            .values()
            .map(|bucket| TagCount {
                tag: bucket.tag.clone(),
                slug: bucket.slug.clone(),
                count: bucket.entries.len(),
            })
            .collect();
        top_tags.sort_by(|a, b| by_count_then_key(a.count, &a.slug, b.count, &b.slug));
        top_tags.truncate(TOP_TAGS);

        let stats = StatsMeta {
            generated: feed.generated,
            total_entries: analysis.total_entries,
            total_sources: analysis.total_sources(),
            total_tags: analysis.total_tags(),
            date_range: DateRange {
                oldest: analysis.oldest,
                newest: analysis.newest,
            },
            entries_by_month,
            entries_by_source,
            top_tags,
        };
        tree.add_json(self.file("meta/stats.json"), &stats)
    }

    fn plan_by_month(
        &self,
        feed: &Feed,
        analysis: &Analysis<'_>,
        tree: &mut OutputTree,
    ) -> Result<()> {
        let mut months = Vec::with_capacity(analysis.by_month.len());
        for (month, entries) in &analysis.by_month {
            let month_feed = feed.with_entries(owned(entries));
            let document = JsonFeed::from_feed(&month_feed, Some(month));
            tree.add(self.file(&format!("by-month/{month}.json")), document.to_bytes()?);
            months.push(MonthRef {
                month: month.clone(),
                count: entries.len(),
                path: self.link(&format!("by-month/{month}.json")),
            });
        }
        months.sort_by(|a, b| by_count_then_key(a.count, &a.month, b.count, &b.month));

        tree.add_json(
            self.file("by-month/index.json"),
            &MonthIndex {
                generated: feed.generated,
                count: months.len(),
                months,
            },
        )
    }

    fn plan_by_source(
        &self,
        feed: &Feed,
        analysis: &Analysis<'_>,
        tree: &mut OutputTree,
    ) -> Result<()> {
        let mut refs = Vec::with_capacity(analysis.by_source.len());
        for bucket in analysis.by_source.values() {
            let mut source_feed = feed.with_entries(owned(&bucket.entries));
            source_feed.title = bucket.title.clone();
            let path = format!("by-source/{}.json", bucket.slug);
            tree.add(self.file(&path), JsonFeed::from_feed(&source_feed, None).to_bytes()?);
            refs.push(SourceRef {
                slug: bucket.slug.clone(),
                title: bucket.title.clone(),
                count: bucket.entries.len(),
                path: self.link(&path),
            });
        }
        refs.sort_by(|a, b| by_count_then_key(a.count, &a.slug, b.count, &b.slug));

        tree.add_json(
            self.file("by-source/index.json"),
            &SourceIndex {
                generated: feed.generated,
                count: refs.len(),
                sources: refs,
            },
        )
    }

    fn plan_by_tag(
        &self,
        feed: &Feed,
        analysis: &Analysis<'_>,
        tree: &mut OutputTree,
    ) -> Result<()> {
        let mut refs = Vec::with_capacity(analysis.by_tag.len());
        for bucket in analysis.by_tag.values() {
            let mut tag_feed = feed.with_entries(owned(&bucket.entries));
            tag_feed.title = format!("Tag: {}", bucket.tag);
            let path = format!("by-tag/{}.json", bucket.slug);
            tree.add(self.file(&path), JsonFeed::from_feed(&tag_feed, None).to_bytes()?);
            refs.push(TagRef {
                tag: bucket.tag.clone(),
                slug: bucket.slug.clone(),
                count: bucket.entries.len(),
                path: self.link(&path),
            });
        }
        refs.sort_by(|a, b| by_count_then_key(a.count, &a.slug, b.count, &b.slug));

        tree.add_json(
            self.file("by-tag/index.json"),
            &TagIndex {
                generated: feed.generated,
                count: refs.len(),
                tags: refs,
            },
        )
    }
}

fn owned(entries: &[&Entry]) -> Vec<Entry> {
    entries.iter().map(|entry| (*entry).clone()).collect()
}
