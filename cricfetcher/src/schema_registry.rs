//! Input field paths the importer maps into the graph.
//!
//! Paths are dot-joined object keys; list elements share their parent's path, so
//! `innings.overs.deliveries.batter` covers every delivery of every over. A
//! trailing `*` segment accepts any key at that level (names, ids, team names).

use std::collections::HashSet;

use once_cell::sync::Lazy;

const MAPPED_PATHS: &[&str] = &[
    "meta",
    "meta.data_version",
    "meta.created",
    "meta.revision",
    "info",
    "info.balls_per_over",
    "info.city",
    "info.dates",
    "info.event",
    "info.event.name",
    "info.event.match_number",
    "info.event.stage",
    "info.event.group",
    "info.gender",
    "info.match_type",
    "info.officials",
    "info.officials.match_referees",
    "info.officials.reserve_umpires",
    "info.officials.tv_umpires",
    "info.officials.umpires",
    "info.outcome",
    "info.outcome.winner",
    "info.outcome.by",
    "info.outcome.by.runs",
    "info.outcome.by.wickets",
    "info.outcome.by.innings",
    "info.outcome.result",
    "info.outcome.method",
    "info.outcome.eliminator",
    "info.overs",
    "info.player_of_match",
    "info.players",
    "info.players.*",
    "info.registry",
    "info.registry.people",
    "info.registry.people.*",
    "info.season",
    "info.team_type",
    "info.teams",
    "info.toss",
    "info.toss.decision",
    "info.toss.winner",
    "info.venue",
    "innings",
    "innings.team",
    "innings.overs",
    "innings.overs.over",
    "innings.overs.deliveries",
    "innings.overs.deliveries.batter",
    "innings.overs.deliveries.bowler",
    "innings.overs.deliveries.non_striker",
    "innings.overs.deliveries.runs",
    "innings.overs.deliveries.runs.batter",
    "innings.overs.deliveries.runs.extras",
    "innings.overs.deliveries.runs.total",
    "innings.overs.deliveries.runs.non_boundary",
    "innings.overs.deliveries.extras",
    "innings.overs.deliveries.extras.*",
    "innings.overs.deliveries.wickets",
    "innings.overs.deliveries.wickets.player_out",
    "innings.overs.deliveries.wickets.kind",
    "innings.overs.deliveries.wickets.fielders",
    "innings.overs.deliveries.wickets.fielders.name",
    "innings.overs.deliveries.wickets.fielders.substitute",
    "innings.overs.deliveries.review",
    "innings.overs.deliveries.review.by",
    "innings.overs.deliveries.review.umpire",
    "innings.overs.deliveries.review.batter",
    "innings.overs.deliveries.review.decision",
    "innings.overs.deliveries.review.type",
    "innings.overs.deliveries.review.umpires_call",
    "innings.overs.deliveries.replacements",
    "innings.overs.deliveries.replacements.match",
    "innings.overs.deliveries.replacements.match.in",
    "innings.overs.deliveries.replacements.match.out",
    "innings.overs.deliveries.replacements.match.reason",
    "innings.overs.deliveries.replacements.match.team",
    "innings.overs.deliveries.replacements.role",
    "innings.overs.deliveries.replacements.role.in",
    "innings.overs.deliveries.replacements.role.out",
    "innings.overs.deliveries.replacements.role.reason",
    "innings.overs.deliveries.replacements.role.role",
    "innings.powerplays",
    "innings.powerplays.from",
    "innings.powerplays.to",
    "innings.powerplays.type",
    "innings.target",
    "innings.target.overs",
    "innings.target.runs",
    "innings.super_over",
    "innings.penalty_runs",
    "innings.penalty_runs.pre",
    "innings.penalty_runs.post",
    "innings.absent_hurt",
    "innings.declared",
    "innings.forfeited",
];

pub struct InputSchemaRegistry {
    exact: HashSet<&'static str>,
    wildcard_parents: HashSet<&'static str>,
}

impl InputSchemaRegistry {
    fn new() -> Self {
        let mut exact = HashSet::new();
        let mut wildcard_parents = HashSet::new();
        for path in MAPPED_PATHS {
            match path.strip_suffix(".*") {
                Some(parent) => {
                    wildcard_parents.insert(parent);
                }
                None => {
                    exact.insert(*path);
                }
            }
        }
        Self {
            exact,
            wildcard_parents,
        }
    }

    /// Whether `path` is mapped, either listed or accepted by a wildcard.
    pub fn is_mapped(&self, path: &str) -> bool {
        if self.exact.contains(path) {
            return true;
        }
        match path.rsplit_once('.') {
            Some((parent, _)) => self.wildcard_parents.contains(parent),
            None => false,
        }
    }

    /// Whether the children of `path` are accepted without individual listing.
    pub fn accepts_any_child(&self, path: &str) -> bool {
        self.wildcard_parents.contains(path)
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard_parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub static INPUT_SCHEMA: Lazy<InputSchemaRegistry> = Lazy::new(InputSchemaRegistry::new);
