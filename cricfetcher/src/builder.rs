//! Match and innings structure: the Match node with its links to season, venue,
//! teams, officials and squads, and one Innings node per innings entry.

use cricstore::batch::{EdgeRow, GraphBatch, NodeRow};
use cricstore::schema::{EdgeType, NodeLabel};
use serde_json::{json, Value};

use crate::deliveries;
use crate::entities;
use crate::models::{InningsRecord, MatchRecord, Powerplay};
use crate::registry::PlayerRegistry;
use crate::season::season_key;

const UNKNOWN: &str = "Unknown";

/// Values resolved once per match and shared by every builder step.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    pub match_id: &'a str,
    pub season: String,
    pub venue: String,
    pub city: String,
    pub registry: PlayerRegistry<'a>,
}

impl<'a> MatchContext<'a> {
    pub fn new(record: &'a MatchRecord, match_id: &'a str) -> Self {
        let info = &record.info;
        Self {
            match_id,
            season: season_key(info.season.as_ref()),
            venue: info.venue.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            city: info.city.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            registry: PlayerRegistry::new(&info.registry.people),
        }
    }
}

pub fn innings_id(match_id: &str, innings_number: usize) -> String {
    format!("{}_innings_{}", match_id, innings_number)
}

/// "runs" or "wickets" depending on which margin is recorded, with its value.
pub fn outcome_margin(record: &MatchRecord) -> (Option<&'static str>, Option<i64>) {
    match &record.info.outcome.by {
        Some(by) if by.runs.is_some() => (Some("runs"), by.runs),
        Some(by) if by.wickets.is_some() => (Some("wickets"), by.wickets),
        _ => (None, None),
    }
}

pub fn add_entities(batch: &mut GraphBatch, record: &MatchRecord, ctx: &MatchContext<'_>) {
    let info = &record.info;
    batch.add_nodes(entities::season_nodes(&ctx.season));
    batch.add_nodes(entities::venue_nodes(&ctx.venue, &ctx.city));

    let team_type = info.team_type.as_deref().unwrap_or("club");
    let innings_teams = record.innings.iter().filter_map(|i| i.team.as_deref());
    batch.add_nodes(entities::team_nodes(
        info.teams.iter().map(String::as_str).chain(innings_teams),
        team_type,
    ));
    batch.add_nodes(entities::player_nodes(&ctx.registry));
    batch.add_nodes(entities::official_nodes(&info.officials));
}

pub fn add_match(batch: &mut GraphBatch, record: &MatchRecord, ctx: &MatchContext<'_>) {
    let info = &record.info;
    let outcome = &info.outcome;
    let (outcome_type, margin) = outcome_margin(record);

    // Every scalar is set on match as well, so a corrected record updates in place.
    let node = NodeRow::new(ctx.match_id)
        .set_prop("date", record.match_date().unwrap_or(UNKNOWN))
        .set_prop("season", ctx.season.as_str())
        .set_prop("venue", ctx.venue.as_str())
        .set_prop("city", ctx.city.as_str())
        .set_prop("match_number", info.event.match_number)
        .set_prop("event_name", info.event.name.clone())
        .set_prop("event_stage", info.event.stage.clone())
        .set_prop("match_type", info.match_type.as_deref().unwrap_or("T20"))
        .set_prop("gender", info.gender.as_deref().unwrap_or("male"))
        .set_prop("teams", info.teams.clone())
        .set_prop("winner", outcome.winner.clone())
        .set_prop("outcome_type", outcome_type)
        .set_prop("outcome_margin", margin)
        .set_prop("result", outcome.result.clone())
        .set_prop("method", outcome.method.clone())
        .set_prop("eliminator", outcome.eliminator.clone())
        .set_prop("toss_winner", info.toss.winner.clone())
        .set_prop("toss_decision", info.toss.decision.clone())
        .set_prop("balls_per_over", info.balls_per_over.unwrap_or(6))
        .set_prop("overs", info.overs.unwrap_or(20));
    batch.add_node(NodeLabel::Match, node);

    let match_id = ctx.match_id;
    batch.add_edge(EdgeType::PlayedIn, EdgeRow::new(match_id, ctx.season.as_str()));
    batch.add_edge(EdgeType::HeldAt, EdgeRow::new(match_id, ctx.venue.as_str()));

    for (index, team) in info.teams.iter().enumerate() {
        let role = if index == 0 { "team1" } else { "team2" };
        batch.add_edge(
            EdgeType::TeamInvolved,
            EdgeRow::new(match_id, team.as_str()).prop("role", role),
        );
    }
    // A re-import without a winner must not leave the previous one linked.
    match &outcome.winner {
        Some(winner) => batch.add_edge(EdgeType::WonBy, EdgeRow::new(match_id, winner.as_str())),
        None => batch.clear_edges_from(EdgeType::WonBy, match_id),
    }
    match &info.toss.winner {
        Some(toss_winner) => {
            batch.add_edge(EdgeType::TossWonBy, EdgeRow::new(match_id, toss_winner.as_str()))
        }
        None => batch.clear_edges_from(EdgeType::TossWonBy, match_id),
    }
    for name in &info.player_of_match {
        if let Some(player_id) = ctx.registry.resolve(Some(name.as_str())) {
            batch.add_edge(EdgeType::PlayerOfMatch, EdgeRow::new(match_id, player_id));
        }
    }
    for (role, names) in &info.officials {
        for name in names {
            batch.add_edge(
                EdgeType::OfficiatedBy,
                EdgeRow::new(match_id, name.as_str()).prop("role", role.as_str()),
            );
        }
    }
    for (team, names) in &info.players {
        for name in names {
            if let Some(player_id) = ctx.registry.resolve(Some(name.as_str())) {
                batch.add_edge(
                    EdgeType::SelectedPlayer,
                    EdgeRow::new(team.as_str(), player_id)
                        .prop("match_id", match_id)
                        .prop("season", ctx.season.as_str()),
                );
            }
        }
    }
}

fn powerplay_phases(powerplays: &[Powerplay]) -> Vec<Value> {
    powerplays
        .iter()
        .map(|pp| {
            json!({
                "from_over": pp.from,
                "to_over": pp.to,
                "type": pp.kind.as_deref().unwrap_or("mandatory"),
            })
        })
        .collect()
}

fn innings_totals(innings: &InningsRecord) -> (i64, i64) {
    innings
        .overs
        .iter()
        .flat_map(|over| over.deliveries.iter())
        .fold((0, 0), |(runs, wickets), d| {
            (runs + d.runs.total, wickets + d.wickets.len() as i64)
        })
}

pub fn add_innings(batch: &mut GraphBatch, record: &MatchRecord, ctx: &MatchContext<'_>) {
    for (index, innings) in record.innings.iter().enumerate() {
        let number = index + 1;
        let id = innings_id(ctx.match_id, number);
        let (total_runs, total_wickets) = innings_totals(innings);
        let first = innings.powerplays.first();
        let target = innings.target.as_ref();

        let node = NodeRow::new(id.as_str())
            .set_prop("match_id", ctx.match_id)
            .set_prop("innings_number", number)
            .set_prop("batting_team", innings.team.clone())
            .set_prop("total_runs", total_runs)
            .set_prop("total_wickets", total_wickets)
            .set_prop("target_runs", target.and_then(|t| t.runs))
            .set_prop("target_overs", target.and_then(|t| t.overs.clone()))
            .set_prop("powerplay_from", first.and_then(|pp| pp.from.clone()))
            .set_prop("powerplay_to", first.and_then(|pp| pp.to.clone()))
            .set_prop("powerplay_phases", powerplay_phases(&innings.powerplays))
            .set_prop("super_over", innings.super_over);
        batch.add_node(NodeLabel::Innings, node);

        batch.add_edge(
            EdgeType::HasInnings,
            EdgeRow::new(ctx.match_id, id.as_str()).prop("innings_number", number),
        );
        if let Some(team) = &innings.team {
            batch.add_edge(EdgeType::BattingTeam, EdgeRow::new(id.as_str(), team.as_str()));
        }

        deliveries::add_overs(batch, innings, number, &id, ctx);
    }
}
