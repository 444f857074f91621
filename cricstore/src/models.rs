use serde::{Deserialize, Serialize};

use crate::batch::Properties;
use crate::schema::{EdgeType, NodeLabel};

// --- Graph read models ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub label: NodeLabel,
    pub key: String,
    pub properties: Properties,
}

impl NodeRecord {
    pub fn str_prop(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_str())
    }

    pub fn i64_prop(&self, name: &str) -> Option<i64> {
        self.properties.get(name).and_then(|v| v.as_i64())
    }

    pub fn bool_prop(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub edge_type: EdgeType,
    pub from_key: String,
    pub to_key: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub created: usize,
    pub matched: usize,
    /// Edges not written because an endpoint node does not exist.
    pub skipped: usize,
}

impl MergeStats {
    pub fn absorb(&mut self, other: MergeStats) {
        self.created += other.created;
        self.matched += other.matched;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub applied: usize,
    pub failed: usize,
}

// --- Metadata Catalog (SQLite) Models ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// ISO date (YYYY-MM-DD) of the last completed run.
    pub last_run_date: String,
    pub last_file_count: i64,
}

#[derive(Debug)]
pub struct TaskLog {
    pub task_id: i64,
    pub task_name: String,
    pub start_time: i64, // Unix timestamp
    pub end_time: Option<i64>,
    pub status: String,
    pub details: Option<String>,
}
