#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use planet_aggregator::{AggregatorError, FetchFeed, JsonFeed, Result, SourceDescriptor};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tokio::sync::Semaphore;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn source(url: &str, title: &str) -> SourceDescriptor {
    SourceDescriptor {
        url: url.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

pub struct TestItem {
    pub title: String,
    pub link: String,
    /// None leaves out both date elements.
    pub published: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

pub fn item(title: &str, link: &str, published: DateTime<Utc>) -> TestItem {
    TestItem {
        title: title.to_string(),
        link: link.to_string(),
        published: Some(published),
        tags: Vec::new(),
    }
}

pub fn undated(title: &str, link: &str) -> TestItem {
    TestItem {
        published: None,
        ..item(title, link, Utc::now())
    }
}

pub fn tagged(mut item: TestItem, tags: &[&str]) -> TestItem {
    item.tags = tags.iter().map(|t| t.to_string()).collect();
    item
}

/// Minimal Atom document.
pub fn atom_feed(title: &str, items: &[TestItem]) -> Vec<u8> {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    xml.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    xml.push_str(&format!("<title>{title}</title><id>urn:test:{title}</id>"));
    xml.push_str("<updated>2026-01-01T00:00:00Z</updated>");
    for (i, item) in items.iter().enumerate() {
        xml.push_str("<entry>");
        xml.push_str(&format!("<title>{}</title><id>urn:test:{title}:{i}</id>", item.title));
        xml.push_str(&format!(r#"<link href="{}"/>"#, item.link));
        if let Some(published) = item.published {
            let date = published.to_rfc3339_opts(SecondsFormat::Secs, true);
            xml.push_str(&format!("<published>{date}</published><updated>{date}</updated>"));
        }
        for tag in &item.tags {
            xml.push_str(&format!(r#"<category term="{tag}"/>"#));
        }
        xml.push_str(&format!("<summary>About {}</summary>", item.title));
        xml.push_str("</entry>");
    }
    xml.push_str("</feed>");
    xml.into_bytes()
}

/// In-memory fetcher. Gated URLs block until the test adds permits to
/// `gate`; the fetcher tracks how many calls are in flight at once.
pub struct FakeFetcher {
    documents: HashMap<String, Vec<u8>>,
    gated: HashSet<String>,
    pub gate: Arc<Semaphore>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            gated: HashSet::new(),
            gate: Arc::new(Semaphore::new(0)),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_feed(mut self, url: &str, body: Vec<u8>) -> Self {
        self.documents.insert(url.to_string(), body);
        self
    }

    pub fn with_gated_feed(mut self, url: &str, body: Vec<u8>) -> Self {
        self.gated.insert(url.to_string());
        self.with_feed(url, body)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchFeed for FakeFetcher {
    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.gated.contains(url) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| AggregatorError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Every file under `root` with its bytes, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(relative, std::fs::read(&path).unwrap());
            }
        }
    }

    let mut files = BTreeMap::new();
    walk(root, root, &mut files);
    files
}

pub fn read_feed(path: &Path) -> JsonFeed {
    JsonFeed::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
