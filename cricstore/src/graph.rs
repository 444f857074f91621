use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde_json::Value;

use crate::batch::{EdgeBatch, NodeBatch, Properties};
use crate::errors::{Result, StorageError};
use crate::models::{EdgeRecord, IndexReport, MergeStats, NodeRecord};
use crate::schema::{EdgeType, NodeLabel, GRAPH_SCHEMA, INDEX_STATEMENTS};
use crate::utils::id::{stable_edge_id, stable_node_id};

/// Equality filter on a single node or edge property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub key: String,
    pub value: Value,
}

impl PropertyFilter {
    pub fn eq(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Selects edges of one kind, optionally narrowed by endpoint keys, by an edge
/// property, or by a property of the source node.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeQuery {
    pub edge_type: EdgeType,
    pub from_key: Option<String>,
    pub to_key: Option<String>,
    pub property: Option<PropertyFilter>,
    pub from_property: Option<PropertyFilter>,
}

impl EdgeQuery {
    pub fn new(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            from_key: None,
            to_key: None,
            property: None,
            from_property: None,
        }
    }

    pub fn from(mut self, key: impl Into<String>) -> Self {
        self.from_key = Some(key.into());
        self
    }

    pub fn to(mut self, key: impl Into<String>) -> Self {
        self.to_key = Some(key.into());
        self
    }

    pub fn with_property(mut self, filter: PropertyFilter) -> Self {
        self.property = Some(filter);
        self
    }

    pub fn with_from_property(mut self, filter: PropertyFilter) -> Self {
        self.from_property = Some(filter);
        self
    }
}

/// The property-graph operations the pipeline depends on: merge-by-key writes,
/// individually or batched, plus counting and filtering reads.
pub trait GraphStore: Send + Sync {
    /// Cheap round-trip used to fail fast before any write.
    fn ping(&self) -> Result<()>;

    /// Creates secondary indexes. Individual failures are logged and counted.
    fn ensure_indexes(&self) -> Result<IndexReport>;

    fn merge_nodes(&self, batch: &NodeBatch) -> Result<MergeStats>;

    fn merge_edges(&self, batch: &EdgeBatch) -> Result<MergeStats>;

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<NodeRecord>>;

    fn find_nodes(&self, label: NodeLabel, filter: Option<&PropertyFilter>) -> Result<Vec<NodeRecord>>;

    fn count_nodes(&self, label: NodeLabel, filter: Option<&PropertyFilter>) -> Result<u64>;

    fn find_edges(&self, query: &EdgeQuery) -> Result<Vec<EdgeRecord>>;

    fn count_edges(&self, query: &EdgeQuery) -> Result<u64>;

    /// Deletes matching nodes together with every edge touching them.
    fn delete_nodes(&self, label: NodeLabel, filter: &PropertyFilter) -> Result<usize>;

    fn delete_edges(&self, query: &EdgeQuery) -> Result<usize>;
}

/// SQLite-backed property graph. Node ids are stable uuid-v5 values of
/// `label|key`, so a merge never depends on what the store already contains.
pub struct SqliteGraph {
    conn: Mutex<Connection>,
}

impl SqliteGraph {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StorageError::Connection(format!("{}: {}", path.display(), e)))?;
        let graph = Self {
            conn: Mutex::new(conn),
        };
        graph.initialize()?;
        Ok(graph)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let graph = Self {
            conn: Mutex::new(conn),
        };
        graph.initialize()?;
        Ok(graph)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;
        // WAL lets readers see a consistent snapshot while the importer writes.
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode = WAL;") {
            log::debug!("WAL journal mode unavailable, keeping default: {}", e);
        }
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
            BEGIN;
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                key TEXT NOT NULL,
                properties TEXT NOT NULL,
                UNIQUE(label, key)
            );
            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                edge_type TEXT NOT NULL,
                from_id TEXT NOT NULL,
                to_id TEXT NOT NULL,
                properties TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn node_exists(tx: &Transaction<'_>, id: &str) -> Result<bool> {
        let found = tx
            .prepare_cached("SELECT 1 FROM nodes WHERE id = ?1")?
            .query_row(params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn edge_exists(tx: &Transaction<'_>, id: &str) -> Result<bool> {
        let found = tx
            .prepare_cached("SELECT 1 FROM edges WHERE id = ?1")?
            .query_row(params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

fn strip_nulls(props: &Properties) -> Properties {
    props
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn parse_properties(raw: &str) -> Result<Properties> {
    Ok(serde_json::from_str(raw)?)
}

fn json_path(key: &str) -> Result<String> {
    let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StorageError::InvalidArg(format!(
            "property name '{}' is not a plain identifier",
            key
        )));
    }
    Ok(format!("'$.{}'", key))
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Appends `json_extract(<column>, '$.key') = ?` to `clauses`.
fn push_property_clause(
    column: &str,
    filter: &PropertyFilter,
    clauses: &mut Vec<String>,
    args: &mut Vec<SqlValue>,
) -> Result<()> {
    let path = json_path(&filter.key)?;
    if filter.value.is_null() {
        clauses.push(format!("json_extract({}, {}) IS NULL", column, path));
    } else {
        clauses.push(format!("json_extract({}, {}) = ?", column, path));
        args.push(sql_value(&filter.value));
    }
    Ok(())
}

fn node_where(label: NodeLabel, filter: Option<&PropertyFilter>) -> Result<(String, Vec<SqlValue>)> {
    let mut clauses = vec!["n.label = ?".to_string()];
    let mut args = vec![SqlValue::Text(label.as_str().to_string())];
    if let Some(filter) = filter {
        push_property_clause("n.properties", filter, &mut clauses, &mut args)?;
    }
    Ok((clauses.join(" AND "), args))
}

fn edge_where(query: &EdgeQuery) -> Result<(String, Vec<SqlValue>)> {
    let meta = GRAPH_SCHEMA.edge(query.edge_type).ok_or_else(|| {
        StorageError::InvalidArg(format!("no schema entry for {}", query.edge_type))
    })?;
    let mut clauses = vec!["e.edge_type = ?".to_string()];
    let mut args = vec![SqlValue::Text(query.edge_type.as_str().to_string())];
    if let Some(key) = &query.from_key {
        clauses.push("e.from_id = ?".to_string());
        args.push(SqlValue::Text(stable_node_id(meta.from_label.as_str(), key)));
    }
    if let Some(key) = &query.to_key {
        clauses.push("e.to_id = ?".to_string());
        args.push(SqlValue::Text(stable_node_id(meta.to_label.as_str(), key)));
    }
    if let Some(filter) = &query.property {
        push_property_clause("e.properties", filter, &mut clauses, &mut args)?;
    }
    if let Some(filter) = &query.from_property {
        push_property_clause("f.properties", filter, &mut clauses, &mut args)?;
    }
    Ok((clauses.join(" AND "), args))
}

const EDGE_FROM: &str =
    "FROM edges e JOIN nodes f ON f.id = e.from_id JOIN nodes t ON t.id = e.to_id";

impl GraphStore for SqliteGraph {
    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn ensure_indexes(&self) -> Result<IndexReport> {
        let conn = self.lock()?;
        let mut report = IndexReport::default();
        for statement in INDEX_STATEMENTS {
            match conn.execute_batch(statement) {
                Ok(()) => {
                    report.applied += 1;
                    log::info!("Executed: {}", statement);
                }
                Err(e) => {
                    report.failed += 1;
                    log::warn!("Index may already exist or is unsupported: {}", e);
                }
            }
        }
        Ok(report)
    }

    fn merge_nodes(&self, batch: &NodeBatch) -> Result<MergeStats> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut stats = MergeStats::default();
        let label = batch.label.as_str();
        for row in &batch.rows {
            let id = stable_node_id(label, &row.key);
            let mut created = strip_nulls(&row.on_create);
            created.extend(strip_nulls(&row.on_match));
            created.insert(
                batch.label.key_property().to_string(),
                Value::String(row.key.clone()),
            );
            let patch = Value::Object(row.on_match.clone()).to_string();

            if Self::node_exists(&tx, &id)? {
                stats.matched += 1;
            } else {
                stats.created += 1;
            }
            tx.prepare_cached(
                "INSERT INTO nodes (id, label, key, properties) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET properties = json_patch(nodes.properties, ?5)",
            )?
            .execute(params![
                id,
                label,
                row.key,
                Value::Object(created).to_string(),
                patch
            ])?;
        }
        tx.commit()?;
        log::debug!(
            "Merged {} {} node(s): {} created, {} matched",
            batch.rows.len(),
            label,
            stats.created,
            stats.matched
        );
        Ok(stats)
    }

    fn merge_edges(&self, batch: &EdgeBatch) -> Result<MergeStats> {
        let meta = GRAPH_SCHEMA.edge(batch.edge_type).ok_or_else(|| {
            StorageError::InvalidArg(format!("no schema entry for {}", batch.edge_type))
        })?;
        let edge_type = batch.edge_type.as_str();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut stats = MergeStats::default();
        for row in &batch.rows {
            let from_id = stable_node_id(meta.from_label.as_str(), &row.from_key);
            let to_id = stable_node_id(meta.to_label.as_str(), &row.to_key);
            if !Self::node_exists(&tx, &from_id)? || !Self::node_exists(&tx, &to_id)? {
                log::debug!(
                    "Skipping {} edge {} -> {}: endpoint missing",
                    edge_type,
                    row.from_key,
                    row.to_key
                );
                stats.skipped += 1;
                continue;
            }

            let mut identity = Properties::new();
            let mut settable = Properties::new();
            for (k, v) in &row.properties {
                if meta.identity.contains(&k.as_str()) {
                    identity.insert(k.clone(), v.clone());
                } else {
                    settable.insert(k.clone(), v.clone());
                }
            }
            for key in meta.identity {
                identity.entry(key.to_string()).or_insert(Value::Null);
            }

            let id = stable_edge_id(edge_type, &from_id, &to_id, &identity);
            if batch.edge_type.is_single_valued() {
                tx.prepare_cached("DELETE FROM edges WHERE edge_type = ?1 AND from_id = ?2 AND id != ?3")?
                    .execute(params![edge_type, from_id, id])?;
            }

            if Self::edge_exists(&tx, &id)? {
                stats.matched += 1;
            } else {
                stats.created += 1;
            }
            let mut created = strip_nulls(&identity);
            created.extend(strip_nulls(&settable));
            tx.prepare_cached(
                "INSERT INTO edges (id, edge_type, from_id, to_id, properties) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET properties = json_patch(edges.properties, ?6)",
            )?
            .execute(params![
                id,
                edge_type,
                from_id,
                to_id,
                Value::Object(created).to_string(),
                Value::Object(settable).to_string()
            ])?;
        }
        tx.commit()?;
        Ok(stats)
    }

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<NodeRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, key, properties FROM nodes WHERE label = ?1 AND key = ?2",
                params![label.as_str(), key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, key, raw)) => Ok(Some(NodeRecord {
                id,
                label,
                key,
                properties: parse_properties(&raw)?,
            })),
            None => Ok(None),
        }
    }

    fn find_nodes(&self, label: NodeLabel, filter: Option<&PropertyFilter>) -> Result<Vec<NodeRecord>> {
        let (where_sql, args) = node_where(label, filter)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT n.id, n.key, n.properties FROM nodes n WHERE {} ORDER BY n.rowid",
            where_sql
        ))?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut nodes = Vec::new();
        for row in rows {
            let (id, key, raw) = row?;
            nodes.push(NodeRecord {
                id,
                label,
                key,
                properties: parse_properties(&raw)?,
            });
        }
        Ok(nodes)
    }

    fn count_nodes(&self, label: NodeLabel, filter: Option<&PropertyFilter>) -> Result<u64> {
        let (where_sql, args) = node_where(label, filter)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM nodes n WHERE {}", where_sql),
            params_from_iter(args),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_edges(&self, query: &EdgeQuery) -> Result<Vec<EdgeRecord>> {
        let (where_sql, args) = edge_where(query)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT e.id, f.key, t.key, e.properties {} WHERE {} ORDER BY e.rowid",
            EDGE_FROM, where_sql
        ))?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            let (id, from_key, to_key, raw) = row?;
            edges.push(EdgeRecord {
                id,
                edge_type: query.edge_type,
                from_key,
                to_key,
                properties: parse_properties(&raw)?,
            });
        }
        Ok(edges)
    }

    fn count_edges(&self, query: &EdgeQuery) -> Result<u64> {
        let (where_sql, args) = edge_where(query)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) {} WHERE {}", EDGE_FROM, where_sql),
            params_from_iter(args),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_nodes(&self, label: NodeLabel, filter: &PropertyFilter) -> Result<usize> {
        let (where_sql, args) = node_where(label, Some(filter))?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let selected = format!("SELECT n.id FROM nodes n WHERE {}", where_sql);
        let mut edge_args = args.clone();
        edge_args.extend(args.iter().cloned());
        tx.execute(
            &format!(
                "DELETE FROM edges WHERE from_id IN ({0}) OR to_id IN ({0})",
                selected
            ),
            params_from_iter(edge_args),
        )?;
        let deleted = tx.execute(
            &format!("DELETE FROM nodes WHERE id IN ({})", selected),
            params_from_iter(args),
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    fn delete_edges(&self, query: &EdgeQuery) -> Result<usize> {
        let (where_sql, args) = edge_where(query)?;
        let conn = self.lock()?;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM edges WHERE id IN (SELECT e.id {} WHERE {})",
                EDGE_FROM, where_sql
            ),
            params_from_iter(args),
        )?;
        Ok(deleted)
    }
}
