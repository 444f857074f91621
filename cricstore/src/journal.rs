//! Append-only text logs written next to the graph.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::io::AsyncWriteExt;

use crate::errors::Result;

async fn append(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// One block per match listing the input paths the importer does not map.
pub struct UnmappedFieldLog {
    path: PathBuf,
}

impl UnmappedFieldLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a block for `match_id`. Nothing is written when `fields` is empty.
    pub async fn record(&self, match_id: &str, fields: &BTreeSet<String>) -> Result<bool> {
        if fields.is_empty() {
            return Ok(false);
        }
        let mut block = format!(
            "\n{}\nTimestamp: {}\nMatch ID: {}\nSkipped Fields:\n",
            "=".repeat(80),
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            match_id
        );
        for field in fields {
            block.push_str("  - ");
            block.push_str(field);
            block.push('\n');
        }
        append(&self.path, &block).await?;
        Ok(true)
    }

    /// Removes the log; a full re-import starts from an empty file.
    pub async fn reset(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// `<timestamp> - <source file>: <error>` lines for matches that failed to import.
pub struct ImportErrorLog {
    path: PathBuf,
}

impl ImportErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, source_file: &str, error: &str) -> Result<()> {
        let line = format!(
            "{} - {}: {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            source_file,
            error.replace('\n', " ")
        );
        append(&self.path, &line).await
    }
}
