//! Read-only queries over an imported graph.

use std::collections::{BTreeSet, HashMap};

use cricstore::errors::Result;
use cricstore::graph::{EdgeQuery, GraphStore};
use cricstore::models::NodeRecord;
use cricstore::schema::{EdgeType, NodeLabel};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Former franchise names mapped to the current one. Unrelated to season
/// normalization; the two tables change for different reasons.
static FRANCHISE_REBRANDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Delhi Daredevils", "Delhi Capitals"),
        ("Kings XI Punjab", "Punjab Kings"),
        ("Royal Challengers Bangalore", "Royal Challengers Bengaluru"),
        ("Rising Pune Supergiant", "Rising Pune Supergiants"),
    ])
});

pub fn canonical_team_name(name: &str) -> &str {
    FRANCHISE_REBRANDS.get(name).copied().unwrap_or(name)
}

/// Every stored name a franchise may appear under, current name included.
pub fn raw_team_names(name: &str) -> BTreeSet<String> {
    let canonical = canonical_team_name(name);
    let mut names: BTreeSet<String> = FRANCHISE_REBRANDS
        .iter()
        .filter(|(_, current)| **current == canonical)
        .map(|(old, _)| old.to_string())
        .collect();
    names.insert(canonical.to_string());
    names
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadToHead {
    pub team1: String,
    pub team2: String,
    pub total_matches: u64,
    pub team1_wins: u64,
    pub team2_wins: u64,
    /// Ties, no results and abandoned matches.
    pub no_result: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchLine {
    pub match_id: String,
    pub date: String,
    pub season: Option<String>,
    pub winner: Option<String>,
    pub result: String,
}

fn describe_result(node: &NodeRecord) -> String {
    if let Some(winner) = node.str_prop("winner") {
        let winner = canonical_team_name(winner);
        return match (node.str_prop("outcome_type"), node.i64_prop("outcome_margin")) {
            (Some(kind), Some(margin)) => format!("{winner} won by {margin} {kind}"),
            _ => format!("{winner} won"),
        };
    }
    node.str_prop("result").unwrap_or("no result").to_string()
}

fn matches_involving(graph: &dyn GraphStore, names: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for name in names {
        for edge in graph.find_edges(&EdgeQuery::new(EdgeType::TeamInvolved).to(name.as_str()))? {
            ids.insert(edge.from_key);
        }
    }
    Ok(ids)
}

fn common_matches(graph: &dyn GraphStore, team1: &str, team2: &str) -> Result<BTreeSet<String>> {
    let first = matches_involving(graph, &raw_team_names(team1))?;
    let second = matches_involving(graph, &raw_team_names(team2))?;
    Ok(first.intersection(&second).cloned().collect())
}

/// Wins between two franchises, counting every historical name of each side.
pub fn head_to_head(graph: &dyn GraphStore, team1: &str, team2: &str) -> Result<HeadToHead> {
    let names1 = raw_team_names(team1);
    let names2 = raw_team_names(team2);
    let mut report = HeadToHead {
        team1: canonical_team_name(team1).to_string(),
        team2: canonical_team_name(team2).to_string(),
        ..Default::default()
    };

    for match_id in common_matches(graph, team1, team2)? {
        report.total_matches += 1;
        let winner = graph
            .find_edges(&EdgeQuery::new(EdgeType::WonBy).from(match_id.as_str()))?
            .into_iter()
            .next()
            .map(|edge| edge.to_key);
        match winner {
            Some(w) if names1.contains(&w) => report.team1_wins += 1,
            Some(w) if names2.contains(&w) => report.team2_wins += 1,
            _ => {}
        }
    }
    report.no_result = report.total_matches - report.team1_wins - report.team2_wins;
    Ok(report)
}

/// Meetings between two franchises, most recent first.
pub fn head_to_head_matches(graph: &dyn GraphStore, team1: &str, team2: &str) -> Result<Vec<MatchLine>> {
    let mut lines = Vec::new();
    for match_id in common_matches(graph, team1, team2)? {
        let Some(node) = graph.get_node(NodeLabel::Match, &match_id)? else {
            continue;
        };
        lines.push(MatchLine {
            date: node.str_prop("date").unwrap_or("Unknown").to_string(),
            season: node.str_prop("season").map(str::to_string),
            winner: node.str_prop("winner").map(|w| canonical_team_name(w).to_string()),
            result: describe_result(&node),
            match_id,
        });
    }
    lines.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.match_id.cmp(&a.match_id)));
    Ok(lines)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub seasons: u64,
    pub venues: u64,
    pub teams: u64,
    pub players: u64,
    pub officials: u64,
    pub matches: u64,
    pub innings: u64,
    pub overs: u64,
    pub deliveries: u64,
}

pub fn summary(graph: &dyn GraphStore) -> Result<GraphSummary> {
    let count = |label| graph.count_nodes(label, None);
    Ok(GraphSummary {
        seasons: count(NodeLabel::Season)?,
        venues: count(NodeLabel::Venue)?,
        teams: count(NodeLabel::Team)?,
        players: count(NodeLabel::Player)?,
        officials: count(NodeLabel::Official)?,
        matches: count(NodeLabel::Match)?,
        innings: count(NodeLabel::Innings)?,
        overs: count(NodeLabel::Over)?,
        deliveries: count(NodeLabel::Delivery)?,
    })
}
