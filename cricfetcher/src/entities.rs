//! Coarse entities shared across matches: seasons, venues, teams, players and
//! officials. Each kind is one batch keyed by its natural identifier; only
//! creation-time attributes are attached, so re-merging never rewrites them.

use std::collections::{BTreeMap, HashSet};

use cricstore::batch::{NodeBatch, NodeRow};
use cricstore::schema::NodeLabel;

use crate::registry::PlayerRegistry;

pub fn season_nodes(season: &str) -> NodeBatch {
    NodeBatch::with_rows(NodeLabel::Season, vec![NodeRow::new(season)])
}

pub fn venue_nodes(venue: &str, city: &str) -> NodeBatch {
    NodeBatch::with_rows(
        NodeLabel::Venue,
        vec![NodeRow::new(venue).create_prop("city", city)],
    )
}

pub fn team_nodes<'a>(teams: impl IntoIterator<Item = &'a str>, team_type: &str) -> NodeBatch {
    let mut seen = HashSet::new();
    let rows = teams
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(|name| NodeRow::new(name).create_prop("team_type", team_type))
        .collect();
    NodeBatch::with_rows(NodeLabel::Team, rows)
}

/// One Player per registry id; the first display name seen for an id is kept.
pub fn player_nodes(registry: &PlayerRegistry<'_>) -> NodeBatch {
    let mut seen = HashSet::new();
    let rows = registry
        .entries()
        .filter(|(_, id)| seen.insert(*id))
        .map(|(name, id)| NodeRow::new(id).create_prop("name", name))
        .collect();
    NodeBatch::with_rows(NodeLabel::Player, rows)
}

/// Officials keyed by name. Someone listed under several roles keeps the first.
pub fn official_nodes(officials: &BTreeMap<String, Vec<String>>) -> NodeBatch {
    let mut seen = HashSet::new();
    let mut batch = NodeBatch::new(NodeLabel::Official);
    for (role, names) in officials {
        for name in names {
            if seen.insert(name.as_str()) {
                batch.push(NodeRow::new(name.as_str()).create_prop("role", role.as_str()));
            }
        }
    }
    batch
}
