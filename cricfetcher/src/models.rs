//! Decoded match records.
//!
//! Every field is optional at every nesting level: sources drift over the
//! years and a missing field must degrade to a default or a null property, never
//! to a decode failure. Fields this model does not know about are dropped here
//! and reported separately by [`crate::audit::FieldAuditor`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Number;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchRecord {
    pub meta: Meta,
    pub info: MatchInfo,
    pub innings: Vec<InningsRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub data_version: Option<String>,
    pub created: Option<String>,
    pub revision: Option<i64>,
}

/// Season labels appear both as strings ("2007/08") and as bare years (2009).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeasonLabel {
    Year(i64),
    Text(String),
}

impl SeasonLabel {
    pub fn raw(&self) -> String {
        match self {
            SeasonLabel::Year(year) => year.to_string(),
            SeasonLabel::Text(text) => text.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchInfo {
    pub balls_per_over: Option<i64>,
    pub city: Option<String>,
    pub dates: Vec<String>,
    pub event: Event,
    pub gender: Option<String>,
    pub match_type: Option<String>,
    pub officials: BTreeMap<String, Vec<String>>,
    pub outcome: Outcome,
    pub overs: Option<i64>,
    pub player_of_match: Vec<String>,
    pub players: BTreeMap<String, Vec<String>>,
    pub registry: Registry,
    pub season: Option<SeasonLabel>,
    pub team_type: Option<String>,
    pub teams: Vec<String>,
    pub toss: Toss,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Event {
    pub name: Option<String>,
    pub match_number: Option<i64>,
    pub stage: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Outcome {
    pub winner: Option<String>,
    pub by: Option<Margin>,
    /// "no result", "tie" or "draw" when there is no winner by margin.
    pub result: Option<String>,
    /// e.g. "D/L" for rain-adjusted results.
    pub method: Option<String>,
    /// Winner of a tie-breaking super over.
    pub eliminator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub runs: Option<i64>,
    pub wickets: Option<i64>,
    pub innings: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registry {
    pub people: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Toss {
    pub winner: Option<String>,
    pub decision: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InningsRecord {
    pub team: Option<String>,
    pub overs: Vec<OverRecord>,
    pub powerplays: Vec<Powerplay>,
    pub target: Option<Target>,
    pub super_over: bool,
    pub declared: bool,
    pub forfeited: bool,
    pub absent_hurt: Vec<String>,
    pub penalty_runs: Option<PenaltyRuns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Powerplay {
    /// Ball notation such as 0.1 or 5.6.
    pub from: Option<Number>,
    pub to: Option<Number>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Target {
    pub runs: Option<i64>,
    pub overs: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PenaltyRuns {
    pub pre: Option<i64>,
    pub post: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverRecord {
    pub over: Option<i64>,
    pub deliveries: Vec<DeliveryRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeliveryRecord {
    pub batter: Option<String>,
    pub bowler: Option<String>,
    pub non_striker: Option<String>,
    pub runs: Runs,
    pub extras: Extras,
    pub wickets: Vec<Wicket>,
    pub review: Option<Review>,
    pub replacements: Option<Replacements>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Runs {
    pub batter: i64,
    pub extras: i64,
    pub total: i64,
    /// Set when four or six runs were run rather than hit to the rope.
    pub non_boundary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Extras {
    pub wides: Option<i64>,
    pub noballs: Option<i64>,
    pub byes: Option<i64>,
    pub legbyes: Option<i64>,
    pub penalty: Option<i64>,
}

impl Extras {
    /// The extras kind recorded on the delivery, by fixed priority.
    pub fn primary_kind(&self) -> Option<&'static str> {
        [
            ("wides", self.wides),
            ("noballs", self.noballs),
            ("byes", self.byes),
            ("legbyes", self.legbyes),
            ("penalty", self.penalty),
        ]
        .into_iter()
        .find(|(_, runs)| runs.is_some())
        .map(|(kind, _)| kind)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Wicket {
    pub player_out: Option<String>,
    pub kind: Option<String>,
    pub fielders: Vec<Fielder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fielder {
    pub name: Option<String>,
    pub substitute: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Review {
    pub by: Option<String>,
    pub umpire: Option<String>,
    pub batter: Option<String>,
    pub decision: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub umpires_call: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Replacements {
    #[serde(rename = "match")]
    pub match_subs: Vec<Replacement>,
    pub role: Vec<RoleReplacement>,
}

/// A player swapped into the match (impact player, concussion substitute).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Replacement {
    #[serde(rename = "in")]
    pub player_in: Option<String>,
    #[serde(rename = "out")]
    pub player_out: Option<String>,
    pub reason: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoleReplacement {
    #[serde(rename = "in")]
    pub player_in: Option<String>,
    #[serde(rename = "out")]
    pub player_out: Option<String>,
    pub reason: Option<String>,
    pub role: Option<String>,
}

impl MatchRecord {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn match_date(&self) -> Option<&str> {
        self.info.dates.first().map(String::as_str)
    }
}
