use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FetcherError, Result};
use crate::models::MatchRecord;

pub const MANIFEST_FILE: &str = "README.txt";

/// One match document available from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub match_id: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// A decoded document plus the raw tree it came from (for field auditing).
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    pub raw: Value,
    pub record: MatchRecord,
}

/// Where match documents come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Every available match, oldest first.
    async fn list(&self) -> Result<Vec<SourceEntry>>;

    /// Reads and decodes one match.
    async fn load(&self, entry: &SourceEntry) -> Result<LoadedRecord>;
}

/// A directory of `<match_id>.json` files with an optional `README.txt` manifest
/// of `YYYY-MM-DD - <team_type> - <event> - <gender> - <match_id> - ...` lines.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn json_files(&self) -> Result<Vec<SourceEntry>> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            FetcherError::InvalidSource(format!("{}: {}", self.root.display(), e))
        })?;
        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let (Some(stem), Some(name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            entries.push(SourceEntry {
                match_id: stem.to_string(),
                file_name: name.to_string(),
                path: path.clone(),
            });
        }
        Ok(entries)
    }

    async fn manifest(&self) -> Result<Option<Vec<(NaiveDate, String)>>> {
        let path = self.root.join(MANIFEST_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(parse_manifest(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Numeric identifiers in numeric order, then everything else lexicographically.
pub fn compare_match_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Dated match ids in play order. Newest-first listings are reversed, then a
/// stable sort by date settles any local disorder.
pub fn parse_manifest(text: &str) -> Vec<(NaiveDate, String)> {
    let mut listed: Vec<(NaiveDate, String)> = text
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split(" - ").collect();
            if parts.len() < 5 {
                return None;
            }
            let date = NaiveDate::parse_from_str(parts[0].trim(), "%Y-%m-%d").ok()?;
            let match_id = parts[4].trim();
            if match_id.is_empty() {
                return None;
            }
            Some((date, match_id.to_string()))
        })
        .collect();

    if let (Some(first), Some(last)) = (listed.first(), listed.last()) {
        if first.0 > last.0 {
            listed.reverse();
        }
    }
    listed.sort_by_key(|(date, _)| *date);
    listed
}

#[async_trait]
impl RecordSource for DirectorySource {
    async fn list(&self) -> Result<Vec<SourceEntry>> {
        let files = self.json_files().await?;
        let mut by_id: HashMap<String, SourceEntry> = files
            .into_iter()
            .map(|entry| (entry.match_id.clone(), entry))
            .collect();

        let mut ordered = Vec::with_capacity(by_id.len());
        if let Some(manifest) = self.manifest().await? {
            let mut seen = HashSet::new();
            for (_, match_id) in manifest {
                if !seen.insert(match_id.clone()) {
                    continue;
                }
                if let Some(entry) = by_id.remove(&match_id) {
                    ordered.push(entry);
                }
            }
            log::debug!("Manifest ordered {} match file(s)", ordered.len());
        }

        let mut rest: Vec<SourceEntry> = by_id.into_values().collect();
        rest.sort_by(|a, b| compare_match_ids(&a.match_id, &b.match_id));
        ordered.extend(rest);

        log::info!("Found {} JSON files to import", ordered.len());
        Ok(ordered)
    }

    async fn load(&self, entry: &SourceEntry) -> Result<LoadedRecord> {
        let bytes = tokio::fs::read(&entry.path).await?;
        let raw: Value = serde_json::from_slice(&bytes).map_err(|source| FetcherError::Decode {
            file: entry.file_name.clone(),
            source,
        })?;
        let record = MatchRecord::deserialize(&raw).map_err(|source| FetcherError::Decode {
            file: entry.file_name.clone(),
            source,
        })?;
        Ok(LoadedRecord { raw, record })
    }
}
