mod common;

use common::*;
use interfaces::{PriorityLink, PriorityLinks};
use planet_aggregator::aggregator::ProgressFn;
use planet_aggregator::archive::archive_month;
use planet_aggregator::dedup::canonical_url;
use planet_aggregator::{
    AggregatorError, ApiConfig, ArchiveConfig, Discussion, Entry, Feed, FetchConfig, FetchProgress,
    JsonFeed, Pipeline, PipelineOptions, SourceDescriptor,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

fn options(dir: &Path) -> PipelineOptions {
    PipelineOptions {
        output_dir: dir.to_path_buf(),
        title: "Test Planet".to_string(),
        generated_at: Some(at(2026, 6, 1)),
        fetch: FetchConfig {
            max_entries: 0,
            ..FetchConfig::default()
        },
        archive: ArchiveConfig {
            latest_months: 2,
            ..ArchiveConfig::default()
        },
        api: ApiConfig {
            planet_name: "Test Planet".to_string(),
            generate_all: true,
            ..ApiConfig::default()
        },
        ..PipelineOptions::default()
    }
}

/// Two sources, six entries spread over January to May.
fn five_month_fixture() -> (FakeFetcher, Vec<SourceDescriptor>) {
    let alpha = atom_feed(
        "Alpha Blog",
        &[
            tagged(item("May post", "http://alpha.example/may", at(2026, 5, 20)), &["Rust"]),
            tagged(
                item("April post", "http://alpha.example/apr", at(2026, 4, 10)),
                &["rust", "Go"],
            ),
            item("March post", "http://alpha.example/mar", at(2026, 3, 3)),
        ],
    );
    let beta = atom_feed(
        "Beta Notes",
        &[
            tagged(item("Feb note", "http://beta.example/feb", at(2026, 2, 14)), &["Go"]),
            item("Jan note", "http://beta.example/jan", at(2026, 1, 2)),
            tagged(item("May note", "http://beta.example/may", at(2026, 5, 1)), &["AI"]),
        ],
    );
    let fetcher = FakeFetcher::new()
        .with_feed("http://alpha.example/feed", alpha)
        .with_feed("http://beta.example/feed", beta);
    let sources = vec![
        SourceDescriptor {
            description: "Posts about systems".to_string(),
            html_url: "http://alpha.example".to_string(),
            ..source("http://alpha.example/feed", "Alpha Blog")
        },
        source("http://beta.example/feed", "Beta Notes"),
    ];
    (fetcher, sources)
}

async fn run_fixture(options: PipelineOptions) -> planet_aggregator::PipelineReport {
    let (fetcher, sources) = five_month_fixture();
    Pipeline::with_fetcher(options, Arc::new(fetcher))
        .run(&sources, None)
        .await
        .unwrap()
}

fn months_of(feed: &JsonFeed) -> HashSet<String> {
    feed.items
        .iter()
        .map(|i| i.date_published.clone().unwrap()[..7].to_string())
        .collect()
}

fn ids_of(feed: &JsonFeed) -> Vec<String> {
    feed.items.iter().map(|i| i.id.clone()).collect()
}

fn archive(dir: &Path, month: &str, entries: Vec<Entry>) {
    let mut feed = Feed::new("Test Planet", at(2026, 5, 31));
    for entry in entries {
        feed.add_entry(entry);
    }
    let bytes = JsonFeed::from_feed(&feed, Some(month)).to_bytes().unwrap();
    std::fs::write(dir.join(format!("feeds-{month}.json")), bytes).unwrap();
}

#[tokio::test]
async fn test_layout_and_latest_window() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let report = run_fixture(options(dir.path())).await;

    assert!(report.errors.is_empty());
    assert_eq!(report.entry_count, 6);

    let root = dir.path();
    for month in ["2026-01", "2026-02", "2026-03", "2026-04", "2026-05"] {
        assert!(root.join(format!("feeds-{month}.json")).exists());
        assert!(root.join(format!("v1/by-month/{month}.json")).exists());
    }
    for file in [
        "feeds.json",
        "index.json",
        "v1/meta/about.json",
        "v1/meta/sources.json",
        "v1/meta/stats.json",
        "v1/feeds/latest.json",
        "v1/by-source/index.json",
        "v1/by-source/alpha-blog.json",
        "v1/by-source/beta-notes.json",
        "v1/by-tag/index.json",
        "v1/by-tag/rust.json",
        "v1/by-tag/go.json",
        "v1/by-tag/ai.json",
        "v1/schema.json",
    ] {
        assert!(root.join(file).exists(), "missing {file}");
    }

    let latest = read_feed(&root.join("v1/feeds/latest.json"));
    assert_eq!(latest.title, "Test Planet");
    assert_eq!(latest.items.len(), 3);
    assert_eq!(
        months_of(&latest),
        HashSet::from(["2026-05".to_string(), "2026-04".to_string()])
    );
    assert_eq!(ids_of(&read_feed(&root.join("feeds.json"))), ids_of(&latest));

    let month_index = read_json(&root.join("v1/by-month/index.json"));
    assert_eq!(month_index["count"], 5);
    let listed: Vec<&str> = month_index["months"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["month"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec!["2026-05", "2026-01", "2026-02", "2026-03", "2026-04"]);

    let root_index = read_json(&root.join("index.json"));
    let files: Vec<&str> = root_index["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    assert_eq!(files[0], "feeds-2026-05.json");
    assert_eq!(files.len(), 5);

    let may = read_feed(&root.join("feeds-2026-05.json"));
    assert_eq!(may.period.as_deref(), Some("2026-05"));
}

#[tokio::test]
async fn test_monthly_partition_is_complete() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    run_fixture(options(dir.path())).await;

    let all: HashSet<String> = ids_of(&read_feed(&dir.path().join("v1/feeds/all.json")))
        .into_iter()
        .collect();

    let mut seen = HashSet::new();
    for month in ["2026-01", "2026-02", "2026-03", "2026-04", "2026-05"] {
        let bucket = read_feed(&dir.path().join(format!("feeds-{month}.json")));
        for item in &bucket.items {
            assert!(seen.insert(item.id.clone()), "{} in two buckets", item.id);
            assert!(item.date_published.as_deref().unwrap().starts_with(month));
        }
    }
    assert_eq!(seen, all);
}

#[tokio::test]
async fn test_views_agree_with_entry_set() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    run_fixture(options(dir.path())).await;
    let root = dir.path();

    let all = read_feed(&root.join("v1/feeds/all.json"));
    let all_ids: HashSet<String> = ids_of(&all).into_iter().collect();

    let stats = read_json(&root.join("v1/meta/stats.json"));
    assert_eq!(stats["total_entries"], 6);
    assert_eq!(stats["total_sources"], 2);
    assert_eq!(stats["total_tags"], 3);
    assert_eq!(stats["date_range"]["oldest"], "2026-01-02T12:00:00Z");
    assert_eq!(stats["date_range"]["newest"], "2026-05-20T12:00:00Z");

    let source_index = read_json(&root.join("v1/by-source/index.json"));
    let mut source_total = 0;
    for source in source_index["sources"].as_array().unwrap() {
        let slug = source["slug"].as_str().unwrap();
        let feed = read_feed(&root.join(format!("v1/by-source/{slug}.json")));
        assert_eq!(feed.items.len() as u64, source["count"].as_u64().unwrap());
        assert_eq!(source["path"], format!("/v1/by-source/{slug}.json"));
        for item in &feed.items {
            assert!(all_ids.contains(&item.id));
            assert_eq!(item.feed_title.as_deref(), source["title"].as_str());
        }
        source_total += feed.items.len();
    }
    assert_eq!(source_total, all.items.len());

    let tag_index = read_json(&root.join("v1/by-tag/index.json"));
    for tag in tag_index["tags"].as_array().unwrap() {
        let name = tag["tag"].as_str().unwrap().to_lowercase();
        let slug = tag["slug"].as_str().unwrap();
        let feed = read_feed(&root.join(format!("v1/by-tag/{slug}.json")));
        let expected = all
            .items
            .iter()
            .filter(|i| i.tags.iter().any(|t| t.to_lowercase() == name))
            .count();
        assert_eq!(feed.items.len(), expected);
        assert_eq!(tag["count"].as_u64().unwrap() as usize, expected);
    }
    // "go" and "rust" tie at two entries; the slug breaks the tie
    let tags = tag_index["tags"].as_array().unwrap();
    let order: Vec<&str> = tags.iter().map(|t| t["slug"].as_str().unwrap()).collect();
    assert_eq!(order, vec!["go", "rust", "ai"]);
    assert_eq!(tags[1]["tag"], "Rust");
    assert_eq!(tags[1]["count"], 2);

    let sources = read_json(&root.join("v1/meta/sources.json"));
    let alpha = sources["sources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["slug"] == "alpha-blog")
        .unwrap();
    assert_eq!(alpha["description"], "Posts about systems");
    assert_eq!(alpha["feed_url"], "http://alpha.example/feed");
    assert_eq!(alpha["entry_count"], 3);
}

#[tokio::test]
async fn test_second_run_is_byte_identical() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    run_fixture(options(dir.path())).await;
    let first = snapshot(dir.path());
    run_fixture(options(dir.path())).await;
    let second = snapshot(dir.path());

    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    assert!(first == second, "output changed between identical runs");
}

#[tokio::test]
async fn test_fresh_priority_wins_over_archive() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let mut archived = Entry::new("Archived", "http://y.com/p", at(2026, 5, 5));
    archived.content = Some("old".to_string());
    archived.discussions = vec![Discussion::new("hackernews", "http://hn/123")];
    archive(dir.path(), "2026-05", vec![archived]);
    archive(
        dir.path(),
        "2025-11",
        vec![Entry::new("Ancient", "http://old.example/x", at(2025, 11, 9))],
    );

    let links = PriorityLinks {
        title: Some("Curated".to_string()),
        description: None,
        period: None,
        updated: at(2026, 5, 30),
        links: vec![PriorityLink {
            title: "Curated pick".to_string(),
            url: "http://y.com/p/".to_string(),
            content_html: Some("new".to_string()),
            rank: 1,
            ..Default::default()
        }],
    };

    let (fetcher, sources) = five_month_fixture();
    let report = Pipeline::with_fetcher(options(dir.path()), Arc::new(fetcher))
        .run(&sources, Some(&links))
        .await
        .unwrap();
    assert_eq!(report.entry_count, 8);

    let all = read_feed(&dir.path().join("v1/feeds/all.json"));
    let matching: Vec<_> = all
        .items
        .iter()
        .filter(|i| canonical_url(i.url.as_deref().unwrap()) == "http://y.com/p")
        .collect();
    assert_eq!(matching.len(), 1);
    let merged = matching[0];
    assert!(merged.priority);
    assert_eq!(merged.rank, 1);
    assert_eq!(merged.title.as_deref(), Some("Curated pick"));
    assert_eq!(merged.content_html.as_deref(), Some("new"));
    assert_eq!(merged.discussions.len(), 1);
    assert_eq!(merged.discussions[0].platform, "hackernews");

    assert!(all
        .items
        .iter()
        .any(|i| i.url.as_deref() == Some("http://old.example/x")));
    assert!(dir.path().join("feeds-2025-11.json").exists());
}

#[tokio::test]
async fn test_malformed_archive_is_skipped() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("feeds-2026-04.json"), b"{ definitely not json").unwrap();
    archive(
        dir.path(),
        "2025-10",
        vec![Entry::new("Survivor", "http://old.example/survivor", at(2025, 10, 1))],
    );

    let report = run_fixture(options(dir.path())).await;
    assert_eq!(report.entry_count, 7);

    // The broken month is rewritten from this run's entries
    let april = read_feed(&dir.path().join("feeds-2026-04.json"));
    assert_eq!(april.items.len(), 1);
    let all = read_feed(&dir.path().join("v1/feeds/all.json"));
    assert!(all.items.iter().any(|i| i.title.as_deref() == Some("Survivor")));
}

#[tokio::test]
async fn test_source_failures_do_not_block_output() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, mut sources) = five_month_fixture();
    sources.push(source("http://down.example/feed", "Down"));

    let report = Pipeline::with_fetcher(options(dir.path()), Arc::new(fetcher))
        .run(&sources, None)
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].feed_title, "Down");
    assert_eq!(report.entry_count, 6);
    let stats = read_json(&dir.path().join("v1/meta/stats.json"));
    assert_eq!(stats["total_sources"], 2);
}

#[tokio::test]
async fn test_write_failure_names_the_path() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"a file, not a directory").unwrap();

    let (fetcher, sources) = five_month_fixture();
    let err = Pipeline::with_fetcher(options(&blocked), Arc::new(fetcher))
        .run(&sources, None)
        .await
        .unwrap_err();

    match err {
        AggregatorError::Write { path, .. } => assert!(path.starts_with(&blocked)),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_single_file_mode() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path());
    opts.archive.monthly = false;
    opts.api.enabled = false;

    run_fixture(opts).await;

    let all = read_feed(&dir.path().join("feeds.json"));
    assert_eq!(all.items.len(), 6);
    assert!(!dir.path().join("index.json").exists());
    assert!(!dir.path().join("feeds-2026-05.json").exists());
    assert!(!dir.path().join("v1").exists());
}

/// Names of the monthly files on disk holding an item with `url`.
fn archive_copies(dir: &Path, url: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| archive_month(name, "feeds").is_some())
        .filter(|name| {
            read_feed(&dir.join(name))
                .items
                .iter()
                .any(|i| i.url.as_deref() == Some(url))
        })
        .collect();
    names.sort();
    names
}

fn indexed_files(dir: &Path) -> Vec<String> {
    read_json(&dir.join("index.json"))["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap().to_string())
        .collect()
}

async fn run_gamma(dir: &Path, clock: chrono::DateTime<chrono::Utc>, with_undated: bool) {
    let mut items = vec![item("Anchor", "http://gamma.example/anchor", at(2026, 4, 15))];
    if with_undated {
        items.push(undated("Floating", "http://gamma.example/floating"));
    }
    let fetcher =
        FakeFetcher::new().with_feed("http://gamma.example/feed", atom_feed("Gamma", &items));
    let mut opts = options(dir);
    opts.generated_at = Some(clock);

    Pipeline::with_fetcher(opts, Arc::new(fetcher))
        .run(&[source("http://gamma.example/feed", "Gamma")], None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_entry_moving_month_leaves_one_archived_copy() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let floating = "http://gamma.example/floating";

    run_gamma(dir.path(), at(2026, 5, 31), true).await;
    assert_eq!(archive_copies(dir.path(), floating), vec!["feeds-2026-05.json"]);

    // Undated items take the run clock, so the entry moves to June
    run_gamma(dir.path(), at(2026, 6, 1), true).await;
    assert_eq!(archive_copies(dir.path(), floating), vec!["feeds-2026-06.json"]);
    let may = read_feed(&dir.path().join("feeds-2026-05.json"));
    assert!(may.items.is_empty());
    assert_eq!(may.period.as_deref(), Some("2026-05"));
    assert_eq!(
        indexed_files(dir.path()),
        vec!["feeds-2026-06.json", "feeds-2026-04.json"]
    );

    // Gone from the feed: the most recent archived copy is the one kept
    run_gamma(dir.path(), at(2026, 6, 2), false).await;
    assert_eq!(archive_copies(dir.path(), floating), vec!["feeds-2026-06.json"]);
    assert_eq!(
        indexed_files(dir.path()),
        vec!["feeds-2026-06.json", "feeds-2026-04.json"]
    );
    let june = read_feed(&dir.path().join("feeds-2026-06.json"));
    assert_eq!(
        june.items[0].date_published.as_deref(),
        Some("2026-06-01T12:00:00Z")
    );
}

#[tokio::test]
async fn test_progress_callback_sees_every_source() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, mut sources) = five_month_fixture();
    sources.push(source("http://down.example/feed", "Down"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let report: Box<ProgressFn> = Box::new(move |p: FetchProgress<'_>| {
        sink.lock()
            .unwrap()
            .push((p.current, p.total, p.title.to_string(), p.error.is_some()));
    });

    Pipeline::with_fetcher(options(dir.path()), Arc::new(fetcher))
        .on_progress(report)
        .run(&sources, None)
        .await
        .unwrap();

    let mut seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|s| s.1 == 3));
    let currents: HashSet<usize> = seen.iter().map(|s| s.0).collect();
    assert_eq!(currents, HashSet::from([1, 2, 3]));
    seen.sort_by(|a, b| a.2.cmp(&b.2));
    let failed: Vec<(&str, bool)> = seen.iter().map(|s| (s.2.as_str(), s.3)).collect();
    assert_eq!(
        failed,
        vec![("Alpha Blog", false), ("Beta Notes", false), ("Down", true)]
    );
}
