pub mod batch;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod graph;
pub mod journal;
pub mod models;
pub mod schema;
pub mod sync;

pub mod utils {
    pub mod id;
}

use crate::catalog::Catalog;
use crate::config::StorageConfig;
use crate::errors::Result;
use crate::graph::{GraphStore, SqliteGraph};
use crate::journal::{ImportErrorLog, UnmappedFieldLog};
use crate::sync::GraphWriter;
use std::sync::Arc;

/// The main entry point for the `cricstore` library.
///
/// `CricStore` bundles everything the importer persists under one base directory:
/// - the match graph (`SqliteGraph`), written through a `GraphWriter`,
/// - a metadata database (`Catalog`) holding run state and task logs,
/// - the unmapped-field and import-error logs.
///
/// # Example
///
/// ```rust,no_run
/// use cricstore::{CricStore, config::StorageConfig};
/// use tempfile::tempdir;
///
/// #[tokio::main]
/// async fn main() {
///     let dir = tempdir().unwrap();
///     let config = StorageConfig::new(dir.path());
///     let store = CricStore::open(config).await.unwrap();
///
///     // Now you can use store.writer, store.graph, etc.
/// }
/// ```
pub struct CricStore {
    pub config: StorageConfig,
    pub catalog: Arc<Catalog>,
    pub graph: Arc<dyn GraphStore>,
    pub writer: Arc<GraphWriter>,
    pub unmapped_log: UnmappedFieldLog,
    pub error_log: ImportErrorLog,
}

impl CricStore {
    /// Opens (creating if needed) the store under `config.base_path`.
    ///
    /// Fails with `StorageError::Connection` when the graph database cannot be
    /// opened or does not answer a ping; no write has happened at that point.
    pub async fn open(config: StorageConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.base_path).await?;

        let graph: Arc<dyn GraphStore> = Arc::new(SqliteGraph::open(&config.graph_path)?);
        graph.ping()?;

        let catalog = Arc::new(Catalog::new(&config)?);
        catalog.initialize_schema()?;

        let writer = Arc::new(GraphWriter::new(Arc::clone(&graph)));

        Ok(Self {
            unmapped_log: UnmappedFieldLog::new(&config.unmapped_log_path),
            error_log: ImportErrorLog::new(&config.error_log_path),
            config,
            catalog,
            graph,
            writer,
        })
    }
}
