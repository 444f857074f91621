//! The import run: gate, repair, import each pending match in source order,
//! then recompute statistics.

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use cricfetcher::error::FetcherError;
use cricfetcher::{build_match_graph, DirectorySource, FieldAuditor, RecordSource, SourceEntry};
use cricstore::errors::StorageError;
use cricstore::models::RunState;
use cricstore::sync::FlushReport;
use cricstore::CricStore;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::aggregate::{AggregationEngine, AggregationReport};
use crate::config::EtlConfig;
use crate::report::{self, GraphSummary};
use crate::tracker::CompletenessTracker;

const PROGRESS_EVERY: usize = 10;

/// Why a single match was not imported. The run continues past these.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] FetcherError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub already_imported: usize,
    pub repaired: Vec<String>,
    pub imported: usize,
    pub failed: usize,
    pub aggregation: AggregationReport,
    pub graph: GraphSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Skipped { reason: String },
    Completed(RunSummary),
}

pub struct EtlPipeline {
    config: EtlConfig,
    store: CricStore,
    source: Arc<dyn RecordSource>,
}

impl EtlPipeline {
    /// Opens the store. Failing to reach it aborts before anything is written.
    pub async fn open(config: EtlConfig) -> anyhow::Result<Self> {
        let store = CricStore::open(config.storage.clone())
            .await
            .with_context(|| format!("failed to open store at {}", config.storage.base_path.display()))?;
        let source: Arc<dyn RecordSource> = Arc::new(DirectorySource::new(&config.source_dir));
        Ok(Self {
            config,
            store,
            source,
        })
    }

    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = source;
        self
    }

    pub fn store(&self) -> &CricStore {
        &self.store
    }

    /// Returns the reason to skip, if the previous run makes this one redundant.
    fn skip_reason(&self, file_count: usize, today: &str) -> anyhow::Result<Option<String>> {
        if self.config.force {
            return Ok(None);
        }
        let Some(state) = self.store.catalog.get_run_state()? else {
            return Ok(None);
        };
        if state.last_run_date == today {
            return Ok(Some(format!("already ran today ({today})")));
        }
        if state.last_file_count == file_count as i64 {
            return Ok(Some(format!("file count unchanged ({file_count})")));
        }
        Ok(None)
    }

    pub async fn run(&self) -> anyhow::Result<RunOutcome> {
        let entries = self
            .source
            .list()
            .await
            .context("failed to list source records")?;
        let today = Local::now().format("%Y-%m-%d").to_string();

        if let Some(reason) = self.skip_reason(entries.len(), &today)? {
            info!(%reason, "Skipping import run");
            return Ok(RunOutcome::Skipped { reason });
        }

        let task_id = self.store.catalog.create_task_log("cricket_import")?;
        match self.import_all(&entries).await {
            Ok(summary) => {
                self.store.catalog.save_run_state(&RunState {
                    last_run_date: today,
                    last_file_count: entries.len() as i64,
                })?;
                let details = serde_json::to_string(&summary)?;
                self.store
                    .catalog
                    .update_task_log_status(task_id, "SUCCESS", &details)?;
                Ok(RunOutcome::Completed(summary))
            }
            Err(err) => {
                error!(error = %err, "Import run failed");
                self.store
                    .catalog
                    .update_task_log_status(task_id, "FAILED", &format!("{err:#}"))?;
                Err(err)
            }
        }
    }

    async fn import_all(&self, entries: &[SourceEntry]) -> anyhow::Result<RunSummary> {
        let graph = Arc::clone(&self.store.graph);
        let indexes = graph.ensure_indexes()?;
        info!(applied = indexes.applied, failed = indexes.failed, "Indexes ensured");

        let tracker = CompletenessTracker::new(Arc::clone(&graph));
        let plan = tracker.prepare(entries)?;
        if plan.fresh {
            self.store.unmapped_log.reset().await?;
        }
        info!(
            files = entries.len(),
            pending = plan.pending.len(),
            already_imported = plan.already_imported,
            repaired = plan.repaired.len(),
            "Import plan ready"
        );

        let mut summary = RunSummary {
            files: entries.len(),
            already_imported: plan.already_imported,
            repaired: plan.repaired.clone(),
            ..Default::default()
        };
        let mut imported_ids = Vec::with_capacity(plan.pending.len());
        let auditor = FieldAuditor::default();

        for (index, entry) in plan.pending.iter().enumerate() {
            match self.import_one(&auditor, entry).await {
                Ok(report) => {
                    summary.imported += 1;
                    imported_ids.push(entry.match_id.clone());
                    if report.edges.skipped > 0 {
                        warn!(
                            match_id = %entry.match_id,
                            skipped = report.edges.skipped,
                            "Relationships skipped for unresolved endpoints"
                        );
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(match_id = %entry.match_id, file = %entry.file_name, error = %err, "Failed to import match");
                    self.store
                        .error_log
                        .record(&entry.file_name, &err.to_string())
                        .await?;
                }
            }
            if (index + 1) % PROGRESS_EVERY == 0 {
                info!(done = index + 1, total = plan.pending.len(), "Import progress");
            }
        }

        let engine = AggregationEngine::new(Arc::clone(&graph));
        for match_id in engine.matches_missing_stats()? {
            if !imported_ids.contains(&match_id) {
                imported_ids.push(match_id);
            }
        }
        summary.aggregation = engine.run(&imported_ids);
        summary.graph = report::summary(graph.as_ref())?;

        info!(
            imported = summary.imported,
            failed = summary.failed,
            matches = summary.graph.matches,
            deliveries = summary.graph.deliveries,
            "Import run complete"
        );
        Ok(summary)
    }

    async fn import_one(&self, auditor: &FieldAuditor<'_>, entry: &SourceEntry) -> Result<FlushReport, ImportError> {
        let loaded = self.source.load(entry).await?;

        let unmapped = auditor.unmapped_paths(&loaded.raw);
        if self.store.unmapped_log.record(&entry.match_id, &unmapped).await? {
            info!(match_id = %entry.match_id, fields = unmapped.len(), "Unmapped fields recorded");
        }

        let batch = build_match_graph(&loaded.record, &entry.match_id);
        Ok(self.store.writer.flush(&batch)?)
    }
}
