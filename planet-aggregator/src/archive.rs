use crate::dedup;
use crate::jsonfeed::JsonFeed;
use crate::types::{Entry, Result};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// The month part of `{prefix}-YYYY-MM.json`, or None for any other name.
pub fn archive_month<'a>(file_name: &'a str, prefix: &str) -> Option<&'a str> {
    let month = file_name
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .strip_suffix(".json")?;

    let (year, mm) = month.split_once('-')?;
    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(year, 4) || !digits(mm, 2) {
        return None;
    }
    match mm.parse::<u32>() {
        Ok(1..=12) => Some(month),
        _ => None,
    }
}

/// What a scan of the output directory found.
#[derive(Debug, Default)]
pub struct LoadedArchive {
    /// Newest month first; within a month, file order.
    pub entries: Vec<Entry>,
    /// Every month with a file on disk, including files that failed to parse.
    pub months: BTreeSet<String>,
}

/// Reads every monthly archive under `dir` back into entries.
///
/// Files are visited newest month first, so when an entry sits in two
/// archives the later copy comes out ahead. A file that cannot be read or
/// parsed is skipped with a warning, as is any item that cannot be turned
/// back into an entry. A missing directory is an empty archive.
pub async fn load_existing_entries(dir: &Path, prefix: &str) -> Result<LoadedArchive> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No archive directory at {}", dir.display());
            return Ok(LoadedArchive::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(dir_entry) = read_dir.next_entry().await? {
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if let Some(month) = archive_month(&name, prefix) {
            files.push((month.to_string(), name));
        }
    }
    files.sort_by(|a, b| b.0.cmp(&a.0));

    let mut loaded = LoadedArchive::default();
    for (month, name) in &files {
        loaded.months.insert(month.clone());
        let path = dir.join(name);
        let feed = match JsonFeed::read_file(&path).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Skipping unreadable archive {}: {}", path.display(), e);
                continue;
            }
        };
        for item in feed.items {
            let id = item.id.clone();
            match Entry::try_from(item) {
                Ok(entry) => loaded.entries.push(entry),
                Err(e) => warn!("Skipping archived item {} in {}: {}", id, name, e),
            }
        }
    }

    info!(
        files = files.len(),
        "Loaded {} archived entries from {}",
        loaded.entries.len(),
        dir.display()
    );
    Ok(loaded)
}

/// Union of this run's entries with archived ones, newest first.
///
/// Fresh entries are placed ahead of archived ones before deduplication, so
/// for a shared canonical URL the fresh content wins while archived
/// discussions are still unioned in and an archived priority flag still
/// promotes.
pub fn merge_entries(existing: Vec<Entry>, fresh: Vec<Entry>) -> Vec<Entry> {
    let mut combined = fresh;
    combined.extend(existing);
    let mut merged = dedup::deduplicate(combined);
    dedup::sort_by_date(&mut merged);
    merged
}
