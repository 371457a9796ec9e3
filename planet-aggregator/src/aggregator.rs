use crate::dedup;
use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::FetchFeed;
use crate::types::{AggregatorError, Entry, FetchConfig, Result, SourceDescriptor, SourceError};
use crate::utils::tags;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// One completed source, as seen by a progress observer.
#[derive(Debug)]
pub struct FetchProgress<'a> {
    pub current: usize,
    pub total: usize,
    pub title: &'a str,
    pub entries: usize,
    pub error: Option<&'a AggregatorError>,
}

pub type ProgressFn = dyn Fn(FetchProgress<'_>) + Send + Sync;

/// Everything one aggregation produced, including the part a deadline cut off.
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    /// Deduplicated, newest first.
    pub entries: Vec<Entry>,
    /// In source-list order.
    pub errors: Vec<SourceError>,
    pub completed: usize,
    /// Sources still pending or in flight when the deadline fired.
    pub abandoned: usize,
}

impl AggregateOutcome {
    pub fn was_cancelled(&self) -> bool {
        self.abandoned > 0
    }
}

pub struct Aggregator {
    fetcher: Arc<dyn FetchFeed>,
    parser: Arc<FeedParser>,
    config: Arc<FetchConfig>,
}

impl Aggregator {
    /// Aggregator backed by the HTTP fetcher.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: FetchConfig, fetcher: Arc<dyn FetchFeed>) -> Self {
        Self {
            fetcher,
            parser: Arc::new(FeedParser::new(&config)),
            config: Arc::new(config),
        }
    }

    /// Fetch and parse a single source.
    pub async fn fetch_source(
        &self,
        source: &SourceDescriptor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Entry>> {
        fetch_one(
            self.fetcher.as_ref(),
            &self.parser,
            source,
            self.config.timeout_seconds,
            now,
        )
        .await
    }

    /// Fetch every source, bounded by the configured concurrency and the
    /// optional whole-run deadline.
    pub async fn fetch_all(
        &self,
        sources: &[SourceDescriptor],
        now: DateTime<Utc>,
    ) -> AggregateOutcome {
        self.fetch_all_until(sources, now, std::future::pending::<()>(), None)
            .await
    }

    /// Fetch every source until all have finished, the configured deadline
    /// passes, or `shutdown` resolves, whichever comes first.
    ///
    /// Results already delivered at that point are kept. Fetches in flight
    /// are left to finish on their own and their results discarded; fetches
    /// that never started are not started.
    pub async fn fetch_all_until<F>(
        &self,
        sources: &[SourceDescriptor],
        now: DateTime<Utc>,
        shutdown: F,
        progress: Option<&ProgressFn>,
    ) -> AggregateOutcome
    where
        F: Future<Output = ()>,
    {
        let total = sources.len();
        let concurrency = self.config.concurrency.max(1);
        info!(sources = total, concurrency, "Starting aggregation");

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<Vec<Entry>>)>();

        for (idx, source) in sources.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let parser = self.parser.clone();
            let timeout_seconds = self.config.timeout_seconds;

            tokio::spawn(async move {
                // Closed semaphore means the run was cancelled before we started
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result =
                    fetch_one(fetcher.as_ref(), &parser, &source, timeout_seconds, now).await;
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let deadline = self.config.deadline_seconds.map(Duration::from_secs);
        let stop = async move {
            match deadline {
                Some(limit) => {
                    tokio::select! {
                        _ = shutdown => {}
                        _ = tokio::time::sleep(limit) => {}
                    }
                }
                None => shutdown.await,
            }
        };
        tokio::pin!(stop);

        let mut slots: Vec<Option<Result<Vec<Entry>>>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        while completed < total {
            tokio::select! {
                biased;
                received = rx.recv() => {
                    let Some((idx, result)) = received else { break };
                    completed += 1;
                    let source = &sources[idx];
                    match &result {
                        Ok(entries) => info!(
                            current = completed,
                            total,
                            entries = entries.len(),
                            "Fetched {}",
                            source.title
                        ),
                        Err(e) => warn!(
                            current = completed,
                            total,
                            "Failed to fetch {}: {}",
                            source.title,
                            e
                        ),
                    }
                    if let Some(report) = progress {
                        report(FetchProgress {
                            current: completed,
                            total,
                            title: &source.title,
                            entries: result.as_ref().map(Vec::len).unwrap_or(0),
                            error: result.as_ref().err(),
                        });
                    }
                    slots[idx] = Some(result);
                }
                _ = &mut stop => {
                    warn!(
                        completed,
                        abandoned = total - completed,
                        "Aggregation stopped, abandoning outstanding fetches"
                    );
                    break;
                }
            }
        }
        semaphore.close();
        drop(rx);

        let mut outcome = AggregateOutcome {
            completed,
            abandoned: total - completed,
            ..AggregateOutcome::default()
        };
        let mut entries = Vec::new();
        for (source, slot) in sources.iter().zip(slots) {
            match slot {
                Some(Ok(fetched)) => entries.extend(fetched),
                Some(Err(error)) => outcome.errors.push(SourceError {
                    feed_title: source.title.clone(),
                    feed_url: source.url.clone(),
                    error,
                }),
                None => {}
            }
        }

        let before = entries.len();
        entries.retain(|entry| tags::matches_any(&entry.tags, &self.config.filter_tags));
        if entries.len() < before {
            debug!("Tag filter dropped {} entries", before - entries.len());
        }

        let mut entries = dedup::deduplicate(entries);
        dedup::sort_by_date(&mut entries);
        outcome.entries = entries;

        info!(
            entries = outcome.entries.len(),
            errors = outcome.errors.len(),
            "Aggregated {}/{} sources",
            completed - outcome.errors.len(),
            total
        );
        outcome
    }
}

async fn fetch_one(
    fetcher: &dyn FetchFeed,
    parser: &FeedParser,
    source: &SourceDescriptor,
    timeout_seconds: u64,
    now: DateTime<Utc>,
) -> Result<Vec<Entry>> {
    if source.url.trim().is_empty() {
        return Err(AggregatorError::MissingFeedUrl {
            title: source.title.clone(),
        });
    }

    let request = fetcher.fetch_document(&source.url);
    let body = match tokio::time::timeout(Duration::from_secs(timeout_seconds), request).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(AggregatorError::Timeout {
                url: source.url.clone(),
                seconds: timeout_seconds,
            })
        }
    };

    parser.parse_source(source, &body, now)
}
