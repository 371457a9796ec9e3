use crate::types::{AggregatorError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One planned output file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Every file of a run, computed in memory before anything touches disk.
#[derive(Debug, Default)]
pub struct OutputTree {
    files: Vec<OutputFile>,
}

impl OutputTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, contents: Vec<u8>) {
        self.files.push(OutputFile {
            path: path.into(),
            contents,
        });
    }

    /// Pretty JSON, two-space indent.
    pub fn add_json<T: Serialize>(&mut self, path: impl Into<PathBuf>, value: &T) -> Result<()> {
        self.add(path, serde_json::to_vec_pretty(value)?);
        Ok(())
    }

    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes the files in plan order. Stops at the first failure and reports
    /// its path; files already written stay on disk.
    pub async fn write(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| AggregatorError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            tokio::fs::write(&path, &file.contents)
                .await
                .map_err(|source| AggregatorError::Write {
                    path: path.clone(),
                    source,
                })?;
            debug!("Wrote {} ({} bytes)", path.display(), file.contents.len());
            written.push(path);
        }
        Ok(written)
    }
}
