use cricstore::batch::GraphBatch;

use crate::builder::{self, MatchContext};
use crate::models::MatchRecord;

/// Maps one decoded match into the full set of graph writes for it.
///
/// Entity nodes come first, then the Match node, then innings, overs and
/// deliveries, so a writer flushing node batches in order always has every
/// endpoint in place before the relationships are merged.
pub fn build_match_graph(record: &MatchRecord, match_id: &str) -> GraphBatch {
    let ctx = MatchContext::new(record, match_id);
    let mut graph = GraphBatch::new();

    builder::add_entities(&mut graph, record, &ctx);
    builder::add_match(&mut graph, record, &ctx);
    builder::add_innings(&mut graph, record, &ctx);

    log::debug!(
        "Mapped match {}: {} node(s), {} relationship(s)",
        match_id,
        graph.node_count(),
        graph.edge_count()
    );
    graph
}
