use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schema::{EdgeType, NodeLabel};

pub type Properties = Map<String, Value>;

/// One node to create-or-match by `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub key: String,
    /// Written only when the node is created.
    pub on_create: Properties,
    /// Written on both create and match; a null value clears the property.
    pub on_match: Properties,
}

impl NodeRow {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            on_create: Properties::new(),
            on_match: Properties::new(),
        }
    }

    pub fn create_prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.on_create.insert(name.to_string(), value.into());
        self
    }

    pub fn set_prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.on_match.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBatch {
    pub label: NodeLabel,
    pub rows: Vec<NodeRow>,
}

impl NodeBatch {
    pub fn new(label: NodeLabel) -> Self {
        Self {
            label,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(label: NodeLabel, rows: Vec<NodeRow>) -> Self {
        Self { label, rows }
    }

    pub fn push(&mut self, row: NodeRow) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One relationship between two nodes addressed by their merge keys.
/// Endpoint labels come from the edge type's schema entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub from_key: String,
    pub to_key: String,
    pub properties: Properties,
}

impl EdgeRow {
    pub fn new(from_key: impl Into<String>, to_key: impl Into<String>) -> Self {
        Self {
            from_key: from_key.into(),
            to_key: to_key.into(),
            properties: Properties::new(),
        }
    }

    pub fn prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBatch {
    pub edge_type: EdgeType,
    pub rows: Vec<EdgeRow>,
}

impl EdgeBatch {
    pub fn new(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(edge_type: EdgeType, rows: Vec<EdgeRow>) -> Self {
        Self { edge_type, rows }
    }
}

/// Accumulates the writes for one match. Node batches keep their insertion order;
/// relationships are grouped per kind and flushed after every node batch.
#[derive(Debug, Default)]
pub struct GraphBatch {
    pub nodes: Vec<NodeBatch>,
    pub edges: BTreeMap<EdgeType, Vec<EdgeRow>>,
    /// Relationships removed from a source node before any new ones are written.
    pub cleared: Vec<(EdgeType, String)>,
}

impl GraphBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nodes(&mut self, batch: NodeBatch) {
        if !batch.is_empty() {
            self.nodes.push(batch);
        }
    }

    pub fn add_node(&mut self, label: NodeLabel, row: NodeRow) {
        self.add_nodes(NodeBatch::with_rows(label, vec![row]));
    }

    pub fn add_edge(&mut self, edge_type: EdgeType, row: EdgeRow) {
        self.edges.entry(edge_type).or_default().push(row);
    }

    /// Drops every `edge_type` relationship leaving `from_key` when flushed.
    pub fn clear_edges_from(&mut self, edge_type: EdgeType, from_key: impl Into<String>) {
        self.cleared.push((edge_type, from_key.into()));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|batch| batch.rows.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn edges_of(&self, edge_type: EdgeType) -> &[EdgeRow] {
        self.edges.get(&edge_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes_of(&self, label: NodeLabel) -> impl Iterator<Item = &NodeRow> {
        self.nodes
            .iter()
            .filter(move |batch| batch.label == label)
            .flat_map(|batch| batch.rows.iter())
    }

    /// Relationship batches in flush order.
    pub fn edge_batches(&self) -> impl Iterator<Item = EdgeBatch> + '_ {
        self.edges
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(edge_type, rows)| EdgeBatch::with_rows(*edge_type, rows.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_node_batches_are_dropped() {
        let mut graph = GraphBatch::new();
        graph.add_nodes(NodeBatch::new(NodeLabel::Team));
        assert!(graph.nodes.is_empty());
        graph.add_node(NodeLabel::Team, NodeRow::new("A"));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn edges_flush_in_kind_order() {
        let mut graph = GraphBatch::new();
        graph.add_edge(EdgeType::FacedBy, EdgeRow::new("d1", "p1"));
        graph.add_edge(EdgeType::PlayedIn, EdgeRow::new("m1", "2008"));
        graph.add_edge(EdgeType::FacedBy, EdgeRow::new("d2", "p1"));
        let kinds: Vec<_> = graph.edge_batches().map(|b| b.edge_type).collect();
        assert_eq!(kinds, vec![EdgeType::PlayedIn, EdgeType::FacedBy]);
        assert_eq!(graph.edges_of(EdgeType::FacedBy).len(), 2);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn cleared_edges_are_not_counted_as_writes() {
        let mut graph = GraphBatch::new();
        graph.clear_edges_from(EdgeType::WonBy, "m1");
        assert_eq!(graph.cleared, vec![(EdgeType::WonBy, "m1".to_string())]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.edge_batches().count(), 0);
    }
}
