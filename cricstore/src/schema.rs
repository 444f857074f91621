//! Labels, relationship kinds and index statements of the match graph.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Season,
    Venue,
    Team,
    Player,
    Official,
    Match,
    Innings,
    Over,
    Delivery,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 9] = [
        NodeLabel::Season,
        NodeLabel::Venue,
        NodeLabel::Team,
        NodeLabel::Player,
        NodeLabel::Official,
        NodeLabel::Match,
        NodeLabel::Innings,
        NodeLabel::Over,
        NodeLabel::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Season => "Season",
            NodeLabel::Venue => "Venue",
            NodeLabel::Team => "Team",
            NodeLabel::Player => "Player",
            NodeLabel::Official => "Official",
            NodeLabel::Match => "Match",
            NodeLabel::Innings => "Innings",
            NodeLabel::Over => "Over",
            NodeLabel::Delivery => "Delivery",
        }
    }

    /// Property holding the merge key; each label has its own namespace.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::Season => "year",
            NodeLabel::Venue | NodeLabel::Team | NodeLabel::Official => "name",
            NodeLabel::Player => "player_id",
            NodeLabel::Match => "match_id",
            NodeLabel::Innings => "innings_id",
            NodeLabel::Over => "over_id",
            NodeLabel::Delivery => "delivery_id",
        }
    }

    pub fn parse(value: &str) -> Option<NodeLabel> {
        NodeLabel::ALL.into_iter().find(|label| label.as_str() == value)
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship kinds. Declaration order is also the flush order used by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeType {
    PlayedIn,
    HeldAt,
    TeamInvolved,
    WonBy,
    TossWonBy,
    PlayerOfMatch,
    OfficiatedBy,
    SelectedPlayer,
    HasInnings,
    BattingTeam,
    HasOver,
    HasDelivery,
    BowledBy,
    FacedBy,
    NonStriker,
    Dismissed,
    CaughtBy,
    StumpedBy,
    RunOutBy,
    ImpactSubIn,
    ImpactSubOut,
    BattingStats,
    BowlingStats,
    Partnership,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::PlayedIn => "PLAYED_IN",
            EdgeType::HeldAt => "HELD_AT",
            EdgeType::TeamInvolved => "TEAM_INVOLVED",
            EdgeType::WonBy => "WON_BY",
            EdgeType::TossWonBy => "TOSS_WON_BY",
            EdgeType::PlayerOfMatch => "PLAYER_OF_MATCH",
            EdgeType::OfficiatedBy => "OFFICIATED_BY",
            EdgeType::SelectedPlayer => "SELECTED_PLAYER",
            EdgeType::HasInnings => "HAS_INNINGS",
            EdgeType::BattingTeam => "BATTING_TEAM",
            EdgeType::HasOver => "HAS_OVER",
            EdgeType::HasDelivery => "HAS_DELIVERY",
            EdgeType::BowledBy => "BOWLED_BY",
            EdgeType::FacedBy => "FACED_BY",
            EdgeType::NonStriker => "NON_STRIKER",
            EdgeType::Dismissed => "DISMISSED",
            EdgeType::CaughtBy => "CAUGHT_BY",
            EdgeType::StumpedBy => "STUMPED_BY",
            EdgeType::RunOutBy => "RUN_OUT_BY",
            EdgeType::ImpactSubIn => "IMPACT_SUB_IN",
            EdgeType::ImpactSubOut => "IMPACT_SUB_OUT",
            EdgeType::BattingStats => "BATTING_STATS",
            EdgeType::BowlingStats => "BOWLING_STATS",
            EdgeType::Partnership => "PARTNERSHIP",
        }
    }

    /// A source node carries at most one edge of these kinds.
    pub fn is_single_valued(&self) -> bool {
        matches!(self, EdgeType::WonBy | EdgeType::TossWonBy)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EdgeMetadata {
    pub edge_type: EdgeType,
    pub from_label: NodeLabel,
    pub to_label: NodeLabel,
    /// Properties the edge is merged on, in addition to its endpoints.
    pub identity: &'static [&'static str],
}

struct EdgeMetaRecord(EdgeType, NodeLabel, NodeLabel, &'static [&'static str]);

const EDGE_METADATA: &[EdgeMetaRecord] = &[
    EdgeMetaRecord(EdgeType::PlayedIn, NodeLabel::Match, NodeLabel::Season, &[]),
    EdgeMetaRecord(EdgeType::HeldAt, NodeLabel::Match, NodeLabel::Venue, &[]),
    EdgeMetaRecord(EdgeType::TeamInvolved, NodeLabel::Match, NodeLabel::Team, &["role"]),
    EdgeMetaRecord(EdgeType::WonBy, NodeLabel::Match, NodeLabel::Team, &[]),
    EdgeMetaRecord(EdgeType::TossWonBy, NodeLabel::Match, NodeLabel::Team, &[]),
    EdgeMetaRecord(EdgeType::PlayerOfMatch, NodeLabel::Match, NodeLabel::Player, &[]),
    EdgeMetaRecord(EdgeType::OfficiatedBy, NodeLabel::Match, NodeLabel::Official, &["role"]),
    EdgeMetaRecord(EdgeType::SelectedPlayer, NodeLabel::Team, NodeLabel::Player, &["match_id", "season"]),
    EdgeMetaRecord(EdgeType::HasInnings, NodeLabel::Match, NodeLabel::Innings, &["innings_number"]),
    EdgeMetaRecord(EdgeType::BattingTeam, NodeLabel::Innings, NodeLabel::Team, &[]),
    EdgeMetaRecord(EdgeType::HasOver, NodeLabel::Innings, NodeLabel::Over, &["over_number"]),
    EdgeMetaRecord(EdgeType::HasDelivery, NodeLabel::Over, NodeLabel::Delivery, &["position"]),
    EdgeMetaRecord(EdgeType::BowledBy, NodeLabel::Delivery, NodeLabel::Player, &[]),
    EdgeMetaRecord(EdgeType::FacedBy, NodeLabel::Delivery, NodeLabel::Player, &[]),
    EdgeMetaRecord(EdgeType::NonStriker, NodeLabel::Delivery, NodeLabel::Player, &[]),
    EdgeMetaRecord(EdgeType::Dismissed, NodeLabel::Delivery, NodeLabel::Player, &["kind"]),
    EdgeMetaRecord(EdgeType::CaughtBy, NodeLabel::Delivery, NodeLabel::Player, &["substitute"]),
    EdgeMetaRecord(EdgeType::StumpedBy, NodeLabel::Delivery, NodeLabel::Player, &["substitute"]),
    EdgeMetaRecord(EdgeType::RunOutBy, NodeLabel::Delivery, NodeLabel::Player, &["substitute"]),
    EdgeMetaRecord(
        EdgeType::ImpactSubIn,
        NodeLabel::Player,
        NodeLabel::Match,
        &["match_id", "replaced_player", "reason", "team", "over", "delivery"],
    ),
    EdgeMetaRecord(
        EdgeType::ImpactSubOut,
        NodeLabel::Player,
        NodeLabel::Match,
        &["match_id", "replaced_by", "reason", "team", "over", "delivery"],
    ),
    EdgeMetaRecord(EdgeType::BattingStats, NodeLabel::Player, NodeLabel::Match, &[]),
    EdgeMetaRecord(EdgeType::BowlingStats, NodeLabel::Player, NodeLabel::Match, &[]),
    EdgeMetaRecord(EdgeType::Partnership, NodeLabel::Player, NodeLabel::Player, &["match_id", "innings_id"]),
];

#[derive(Debug)]
pub struct GraphSchema {
    edges: HashMap<EdgeType, EdgeMetadata>,
}

impl GraphSchema {
    fn from_records() -> Self {
        let edges = EDGE_METADATA
            .iter()
            .map(|EdgeMetaRecord(edge_type, from, to, identity)| {
                (
                    *edge_type,
                    EdgeMetadata {
                        edge_type: *edge_type,
                        from_label: *from,
                        to_label: *to,
                        identity,
                    },
                )
            })
            .collect();
        Self { edges }
    }

    pub fn edge(&self, edge_type: EdgeType) -> Option<&EdgeMetadata> {
        self.edges.get(&edge_type)
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeMetadata> {
        self.edges.values()
    }
}

pub static GRAPH_SCHEMA: Lazy<GraphSchema> = Lazy::new(GraphSchema::from_records);

/// Secondary indexes on the properties the pipeline filters by.
pub const INDEX_STATEMENTS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_delivery_match ON nodes(label, json_extract(properties, '$.match_id'))",
    "CREATE INDEX IF NOT EXISTS idx_node_innings ON nodes(label, json_extract(properties, '$.innings_id'))",
    "CREATE INDEX IF NOT EXISTS idx_match_season ON nodes(label, json_extract(properties, '$.season'))",
    "CREATE INDEX IF NOT EXISTS idx_match_date ON nodes(label, json_extract(properties, '$.date'))",
    "CREATE INDEX IF NOT EXISTS idx_edge_match ON edges(edge_type, json_extract(properties, '$.match_id'))",
    "CREATE INDEX IF NOT EXISTS idx_edge_from ON edges(edge_type, from_id)",
    "CREATE INDEX IF NOT EXISTS idx_edge_to ON edges(edge_type, to_id)",
];
