use std::sync::Arc;

use serde::Serialize;

use crate::batch::GraphBatch;
use crate::errors::Result;
use crate::graph::{EdgeQuery, GraphStore};
use crate::models::MergeStats;

/// Totals of one flush, split by node and relationship writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub nodes: MergeStats,
    pub edges: MergeStats,
    pub cleared: usize,
    pub statements: usize,
}

impl FlushReport {
    pub fn absorb(&mut self, other: FlushReport) {
        self.nodes.absorb(other.nodes);
        self.edges.absorb(other.edges);
        self.cleared += other.cleared;
        self.statements += other.statements;
    }
}

/// Applies accumulated [`GraphBatch`]es to a graph store.
///
/// Node batches are written first, in the order they were added, so every
/// relationship written afterwards can resolve its endpoints. Cleared
/// relationships are deleted next, then relationship batches follow grouped
/// by kind, one store call per kind.
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn flush(&self, batch: &GraphBatch) -> Result<FlushReport> {
        let mut report = FlushReport::default();

        for nodes in &batch.nodes {
            let stats = self.store.merge_nodes(nodes)?;
            report.nodes.absorb(stats);
            report.statements += 1;
        }

        for (edge_type, from_key) in &batch.cleared {
            let query = EdgeQuery::new(*edge_type).from(from_key.as_str());
            let deleted = self.store.delete_edges(&query)?;
            if deleted > 0 {
                log::debug!("{} {} relationship(s) cleared from {}", deleted, edge_type, from_key);
            }
            report.cleared += deleted;
            report.statements += 1;
        }

        for edges in batch.edge_batches() {
            let stats = self.store.merge_edges(&edges)?;
            if stats.skipped > 0 {
                log::debug!(
                    "{} {} relationship(s) skipped, endpoint not in graph",
                    stats.skipped,
                    edges.edge_type
                );
            }
            report.edges.absorb(stats);
            report.statements += 1;
        }

        log::info!(
            "Flushed {} node(s) and {} relationship(s) in {} statement(s)",
            batch.node_count(),
            batch.edge_count(),
            report.statements
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{EdgeRow, NodeBatch, NodeRow};
    use crate::graph::{EdgeQuery, SqliteGraph};
    use crate::schema::{EdgeType, NodeLabel};

    fn sample_batch() -> GraphBatch {
        let mut batch = GraphBatch::new();
        batch.add_edge(EdgeType::PlayedIn, EdgeRow::new("m1", "2008"));
        batch.add_edge(EdgeType::HeldAt, EdgeRow::new("m1", "Wankhede"));
        batch.add_node(NodeLabel::Season, NodeRow::new("2008"));
        batch.add_node(NodeLabel::Venue, NodeRow::new("Wankhede").create_prop("city", "Mumbai"));
        batch.add_nodes(NodeBatch::with_rows(
            NodeLabel::Match,
            vec![NodeRow::new("m1").set_prop("season", "2008")],
        ));
        batch
    }

    #[test]
    fn test_flush_writes_nodes_before_edges() {
        let store = Arc::new(SqliteGraph::in_memory().unwrap());
        let writer = GraphWriter::new(store.clone());

        let report = writer.flush(&sample_batch()).unwrap();
        assert_eq!(report.nodes.created, 3);
        assert_eq!(report.edges.created, 2);
        assert_eq!(report.edges.skipped, 0);
        assert_eq!(report.statements, 5);
        assert_eq!(store.count_edges(&EdgeQuery::new(EdgeType::PlayedIn)).unwrap(), 1);
    }

    #[test]
    fn test_reflush_matches_everything() {
        let store = Arc::new(SqliteGraph::in_memory().unwrap());
        let writer = GraphWriter::new(store.clone());
        writer.flush(&sample_batch()).unwrap();

        let again = writer.flush(&sample_batch()).unwrap();
        assert_eq!(again.nodes.created + again.edges.created, 0);
        assert_eq!(again.nodes.matched, 3);
        assert_eq!(again.edges.matched, 2);
        assert_eq!(store.count_nodes(NodeLabel::Match, None).unwrap(), 1);
    }

    #[test]
    fn test_cleared_edges_are_removed_before_writes() {
        let store = Arc::new(SqliteGraph::in_memory().unwrap());
        let writer = GraphWriter::new(store.clone());
        let mut first = sample_batch();
        first.add_node(NodeLabel::Team, NodeRow::new("A"));
        first.add_edge(EdgeType::WonBy, EdgeRow::new("m1", "A"));
        writer.flush(&first).unwrap();
        let won_by = EdgeQuery::new(EdgeType::WonBy).from("m1");
        assert_eq!(store.count_edges(&won_by).unwrap(), 1);

        let mut corrected = sample_batch();
        corrected.clear_edges_from(EdgeType::WonBy, "m1");
        let report = writer.flush(&corrected).unwrap();
        assert_eq!(report.cleared, 1);
        assert_eq!(store.count_edges(&won_by).unwrap(), 0);
        assert_eq!(store.count_edges(&EdgeQuery::new(EdgeType::PlayedIn)).unwrap(), 1);

        // Clearing and re-adding in one batch leaves the new relationship.
        let mut restored = sample_batch();
        restored.clear_edges_from(EdgeType::WonBy, "m1");
        restored.add_edge(EdgeType::WonBy, EdgeRow::new("m1", "A"));
        let report = writer.flush(&restored).unwrap();
        assert_eq!(report.cleared, 0);
        assert_eq!(report.edges.created, 1);
        assert_eq!(store.count_edges(&won_by).unwrap(), 1);
    }
}
