//! Decides, from the graph's current content alone, which matches a run must
//! (re)import.

use std::collections::HashSet;
use std::sync::Arc;

use cricfetcher::SourceEntry;
use cricstore::errors::Result;
use cricstore::graph::{EdgeQuery, GraphStore, PropertyFilter};
use cricstore::schema::{EdgeType, NodeLabel};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// No Match node.
    Absent,
    /// Innings exist but not a single delivery was written.
    Partial,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub deliveries: usize,
    pub overs: usize,
    pub innings: usize,
    pub matches: usize,
    pub partnerships: usize,
}

/// What a run has to do, in source order.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub pending: Vec<SourceEntry>,
    pub repaired: Vec<String>,
    pub already_imported: usize,
    /// True when the graph held no matches before this run.
    pub fresh: bool,
}

pub struct CompletenessTracker {
    graph: Arc<dyn GraphStore>,
}

fn by_match(match_id: &str) -> PropertyFilter {
    PropertyFilter::eq("match_id", match_id)
}

impl CompletenessTracker {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    pub fn status(&self, match_id: &str) -> Result<MatchStatus> {
        if self.graph.get_node(NodeLabel::Match, match_id)?.is_none() {
            return Ok(MatchStatus::Absent);
        }
        let innings = self.graph.count_nodes(NodeLabel::Innings, Some(&by_match(match_id)))?;
        if innings == 0 {
            return Ok(MatchStatus::Complete);
        }
        let deliveries = self.graph.count_nodes(NodeLabel::Delivery, Some(&by_match(match_id)))?;
        Ok(if deliveries == 0 {
            MatchStatus::Partial
        } else {
            MatchStatus::Complete
        })
    }

    pub fn imported_match_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .graph
            .find_nodes(NodeLabel::Match, None)?
            .into_iter()
            .map(|node| node.key)
            .collect())
    }

    pub fn partial_match_ids(&self) -> Result<Vec<String>> {
        let mut partial = Vec::new();
        for node in self.graph.find_nodes(NodeLabel::Match, None)? {
            if self.status(&node.key)? == MatchStatus::Partial {
                warn!(match_id = %node.key, "Partial import detected: innings created but 0 deliveries");
                partial.push(node.key);
            }
        }
        Ok(partial)
    }

    /// Removes everything a match import writes that is keyed by the match id,
    /// returning the match to the absent state.
    pub fn repair(&self, match_id: &str) -> Result<RepairReport> {
        let filter = by_match(match_id);
        let report = RepairReport {
            partnerships: self
                .graph
                .delete_edges(&EdgeQuery::new(EdgeType::Partnership).with_property(filter.clone()))?,
            deliveries: self.graph.delete_nodes(NodeLabel::Delivery, &filter)?,
            overs: self.graph.delete_nodes(NodeLabel::Over, &filter)?,
            innings: self.graph.delete_nodes(NodeLabel::Innings, &filter)?,
            matches: self
                .graph
                .delete_nodes(NodeLabel::Match, &PropertyFilter::eq("match_id", match_id))?,
        };
        info!(match_id, ?report, "Deleted partial import data");
        Ok(report)
    }

    /// Repairs partial matches, then selects every source entry without a
    /// Match node. `entries` must already be in chronological order.
    pub fn prepare(&self, entries: &[SourceEntry]) -> Result<ImportPlan> {
        let imported_before = self.imported_match_ids()?;
        let fresh = imported_before.is_empty();

        let partial = if fresh { Vec::new() } else { self.partial_match_ids()? };
        for match_id in &partial {
            self.repair(match_id)?;
        }

        let imported = if partial.is_empty() {
            imported_before
        } else {
            self.imported_match_ids()?
        };
        let pending: Vec<SourceEntry> = entries
            .iter()
            .filter(|entry| !imported.contains(&entry.match_id))
            .cloned()
            .collect();

        Ok(ImportPlan {
            already_imported: entries.len() - pending.len(),
            pending,
            repaired: partial,
            fresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cricstore::batch::{EdgeRow, NodeBatch, NodeRow};
    use cricstore::graph::SqliteGraph;
    use std::path::PathBuf;

    fn entry(id: &str) -> SourceEntry {
        SourceEntry {
            match_id: id.to_string(),
            file_name: format!("{id}.json"),
            path: PathBuf::from(format!("/src/{id}.json")),
        }
    }

    fn seed(graph: &SqliteGraph, match_id: &str, with_delivery: bool) {
        let innings_id = format!("{match_id}_innings_1");
        graph
            .merge_nodes(&NodeBatch::with_rows(NodeLabel::Match, vec![NodeRow::new(match_id)]))
            .unwrap();
        graph
            .merge_nodes(&NodeBatch::with_rows(
                NodeLabel::Innings,
                vec![NodeRow::new(innings_id.as_str()).set_prop("match_id", match_id)],
            ))
            .unwrap();
        graph
            .merge_edges(&cricstore::batch::EdgeBatch::with_rows(
                EdgeType::HasInnings,
                vec![EdgeRow::new(match_id, innings_id.as_str()).prop("innings_number", 1)],
            ))
            .unwrap();
        if with_delivery {
            graph
                .merge_nodes(&NodeBatch::with_rows(
                    NodeLabel::Delivery,
                    vec![NodeRow::new(format!("{innings_id}_over_0_ball_1")).create_prop("match_id", match_id)],
                ))
                .unwrap();
        }
    }

    #[test]
    fn classifies_absent_partial_and_complete() {
        let graph = Arc::new(SqliteGraph::in_memory().unwrap());
        seed(&graph, "1", true);
        seed(&graph, "2", false);
        let tracker = CompletenessTracker::new(graph.clone());

        assert_eq!(tracker.status("1").unwrap(), MatchStatus::Complete);
        assert_eq!(tracker.status("2").unwrap(), MatchStatus::Partial);
        assert_eq!(tracker.status("3").unwrap(), MatchStatus::Absent);
        assert_eq!(tracker.partial_match_ids().unwrap(), vec!["2".to_string()]);
    }

    #[test]
    fn prepare_repairs_partials_and_keeps_source_order() {
        let graph = Arc::new(SqliteGraph::in_memory().unwrap());
        seed(&graph, "1", true);
        seed(&graph, "2", false);
        let tracker = CompletenessTracker::new(graph.clone());

        let entries = vec![entry("1"), entry("2"), entry("3")];
        let plan = tracker.prepare(&entries).unwrap();
        let pending: Vec<_> = plan.pending.iter().map(|e| e.match_id.as_str()).collect();
        assert_eq!(pending, vec!["2", "3"]);
        assert_eq!(plan.repaired, vec!["2".to_string()]);
        assert_eq!(plan.already_imported, 1);
        assert!(!plan.fresh);

        assert_eq!(tracker.status("2").unwrap(), MatchStatus::Absent);
        assert_eq!(graph.count_nodes(NodeLabel::Innings, None).unwrap(), 1);
        assert_eq!(graph.count_edges(&EdgeQuery::new(EdgeType::HasInnings)).unwrap(), 1);
    }

    #[test]
    fn empty_graph_is_a_fresh_start() {
        let graph = Arc::new(SqliteGraph::in_memory().unwrap());
        let tracker = CompletenessTracker::new(graph);
        let plan = tracker.prepare(&[entry("7")]).unwrap();
        assert!(plan.fresh);
        assert_eq!(plan.pending.len(), 1);
    }
}
