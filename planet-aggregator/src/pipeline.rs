use crate::aggregator::{Aggregator, ProgressFn};
use crate::aggregators::{monthly_file_name, MonthlyIndex, MonthlyPartitioner};
use crate::api::{ApiConfig, Materializer};
use crate::archive;
use crate::dedup;
use crate::jsonfeed::JsonFeed;
use crate::output::OutputTree;
use crate::priority::priority_entries;
use crate::traits::FetchFeed;
use crate::types::{Feed, FetchConfig, Result, SourceDescriptor, SourceError};
use chrono::{DateTime, Timelike, Utc};
use interfaces::priority::PriorityLinks;
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Split output into `{prefix}-YYYY-MM.json` files plus `index.json`.
    pub monthly: bool,
    pub prefix: String,
    /// Months in the latest-window feeds. Zero or negative means all.
    pub latest_months: i32,
    /// Reload existing monthly files and merge them in. Only applies with
    /// `monthly`.
    pub merge: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            monthly: true,
            prefix: "feeds".to_string(),
            latest_months: 3,
            merge: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    pub title: String,
    pub description: Option<String>,
    pub home_url: Option<String>,
    pub fetch: FetchConfig,
    pub archive: ArchiveConfig,
    pub api: ApiConfig,
    /// Clock for the run. Every generation stamp and the date given to
    /// undated items come from here; `None` reads the system clock once.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            title: "Planet".to_string(),
            description: None,
            home_url: None,
            fetch: FetchConfig::default(),
            archive: ArchiveConfig::default(),
            api: ApiConfig::default(),
            generated_at: None,
        }
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    /// In write order.
    pub written: Vec<PathBuf>,
    pub errors: Vec<SourceError>,
    pub entry_count: usize,
    /// Sources cut off by the deadline or a shutdown signal.
    pub abandoned: usize,
}

/// One batch pass: fetch, merge with the archive, partition, materialize.
pub struct Pipeline {
    aggregator: Aggregator,
    options: PipelineOptions,
    progress: Option<Box<ProgressFn>>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Result<Self> {
        let aggregator = Aggregator::new(options.fetch.clone())?;
        Ok(Self {
            aggregator,
            options,
            progress: None,
        })
    }

    pub fn with_fetcher(options: PipelineOptions, fetcher: Arc<dyn FetchFeed>) -> Self {
        Self {
            aggregator: Aggregator::with_fetcher(options.fetch.clone(), fetcher),
            options,
            progress: None,
        }
    }

    pub fn on_progress(mut self, progress: Box<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(
        &self,
        sources: &[SourceDescriptor],
        priority: Option<&PriorityLinks>,
    ) -> Result<PipelineReport> {
        self.run_until(sources, priority, std::future::pending::<()>())
            .await
    }

    /// Like [`Pipeline::run`], but fetching stops early when `shutdown`
    /// resolves. Whatever was fetched by then is still written.
    pub async fn run_until<F>(
        &self,
        sources: &[SourceDescriptor],
        priority: Option<&PriorityLinks>,
        shutdown: F,
    ) -> Result<PipelineReport>
    where
        F: Future<Output = ()>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);
        self.execute(run_id, sources, priority, shutdown)
            .instrument(span)
            .await
    }

    async fn execute<F>(
        &self,
        run_id: Uuid,
        sources: &[SourceDescriptor],
        priority: Option<&PriorityLinks>,
        shutdown: F,
    ) -> Result<PipelineReport>
    where
        F: Future<Output = ()>,
    {
        let options = &self.options;
        let now = options.generated_at.unwrap_or_else(Utc::now);
        let now = now.with_nanosecond(0).unwrap_or(now);
        info!(sources = sources.len(), "Starting run at {}", dedup::rfc3339(&now));

        let outcome = self
            .aggregator
            .fetch_all_until(sources, now, shutdown, self.progress.as_deref())
            .await;

        let mut entries = outcome.entries;
        if let Some(links) = priority {
            let curated = priority_entries(links);
            info!("Adding {} priority links", curated.len());
            entries.extend(curated);
        }
        let mut entries = dedup::deduplicate(entries);
        dedup::sort_by_date(&mut entries);

        let archive_cfg = &options.archive;
        let mut archived_months = BTreeSet::new();
        if archive_cfg.monthly && archive_cfg.merge {
            match archive::load_existing_entries(&options.output_dir, &archive_cfg.prefix).await {
                Ok(loaded) => {
                    archived_months = loaded.months;
                    if !loaded.entries.is_empty() {
                        entries = archive::merge_entries(loaded.entries, entries);
                        info!("After merge: {} entries", entries.len());
                    }
                }
                Err(e) => warn!("Could not load existing archives: {}", e),
            }
        }

        let mut feed = Feed::new(options.title.clone(), now);
        feed.description = options.description.clone();
        feed.home_url = options.home_url.clone();
        feed.entries = entries;

        let mut tree = OutputTree::new();
        let partitioner = MonthlyPartitioner::new(archive_cfg.latest_months);
        let latest = if archive_cfg.monthly {
            let partition = partitioner.partition(&feed);
            for (month, bucket) in &partition.buckets {
                let document = JsonFeed::from_feed(bucket, Some(month));
                tree.add(
                    monthly_file_name(&archive_cfg.prefix, month),
                    document.to_bytes()?,
                );
            }
            // Months whose entries all moved elsewhere keep their file, emptied
            let emptied = archived_months
                .iter()
                .filter(|month| !partition.buckets.contains_key(*month));
            for month in emptied {
                debug!("Emptying archive for {}", month);
                let document = JsonFeed::from_feed(&feed.with_entries(Vec::new()), Some(month));
                tree.add(
                    monthly_file_name(&archive_cfg.prefix, month),
                    document.to_bytes()?,
                );
            }
            tree.add_json(
                "index.json",
                &MonthlyIndex::build(&partition, &archive_cfg.prefix, &feed.title, now),
            )?;
            tree.add(
                format!("{}.json", archive_cfg.prefix),
                JsonFeed::from_feed(&partition.latest, None).to_bytes()?,
            );
            partition.latest
        } else {
            tree.add(
                format!("{}.json", archive_cfg.prefix),
                JsonFeed::from_feed(&feed, None).to_bytes()?,
            );
            partitioner.latest(&feed)
        };

        if options.api.enabled {
            Materializer::new(options.api.clone()).plan(&feed, &latest, sources, &mut tree)?;
        }

        let written = tree.write(&options.output_dir).await?;
        info!(
            files = written.len(),
            entries = feed.entries.len(),
            errors = outcome.errors.len(),
            "Wrote output to {}",
            options.output_dir.display()
        );

        Ok(PipelineReport {
            run_id,
            written,
            errors: outcome.errors,
            entry_count: feed.entries.len(),
            abandoned: outcome.abandoned,
        })
    }
}
