//! Expands overs into Over and Delivery nodes plus the per-ball relationships.

use cricstore::batch::{EdgeRow, GraphBatch, NodeBatch, NodeRow};
use cricstore::schema::{EdgeType, NodeLabel};

use crate::builder::MatchContext;
use crate::models::{DeliveryRecord, InningsRecord, Powerplay};

pub fn over_id(innings_id: &str, over_number: i64) -> String {
    format!("{}_over_{}", innings_id, over_number)
}

pub fn delivery_id(over_id: &str, ball_in_over: usize) -> String {
    format!("{}_ball_{}", over_id, ball_in_over)
}

/// Type of the first powerplay whose over range contains `over_number`.
/// Ranges are given in ball notation (0.1 to 5.6 covers overs 0 through 5).
pub fn powerplay_for_over(powerplays: &[Powerplay], over_number: i64) -> Option<&str> {
    powerplays
        .iter()
        .find(|pp| {
            let from = pp.from.as_ref().and_then(|n| n.as_f64());
            let to = pp.to.as_ref().and_then(|n| n.as_f64());
            match (from, to) {
                (Some(from), Some(to)) => {
                    let over = over_number as f64;
                    from.trunc() <= over && over <= to.trunc()
                }
                _ => false,
            }
        })
        .map(|pp| pp.kind.as_deref().unwrap_or("mandatory"))
}

/// Position of a delivery inside its innings.
struct BallPosition<'a> {
    innings_id: &'a str,
    innings_number: usize,
    over_id: &'a str,
    over_number: i64,
    ball_in_over: usize,
    delivery_number: usize,
    powerplay: Option<&'a str>,
}

fn delivery_node(id: &str, d: &DeliveryRecord, pos: &BallPosition<'_>, match_id: &str) -> NodeRow {
    let wicket = d.wickets.first();
    let review = d.review.as_ref();

    // Deliveries are immutable once written; everything is creation-time.
    NodeRow::new(id)
        .create_prop("match_id", match_id)
        .create_prop("innings_id", pos.innings_id)
        .create_prop("innings_number", pos.innings_number)
        .create_prop("over_id", pos.over_id)
        .create_prop("over_number", pos.over_number)
        .create_prop("ball_in_over", pos.ball_in_over)
        .create_prop("delivery_number", pos.delivery_number)
        .create_prop("powerplay_phase", pos.powerplay)
        .create_prop("runs_batter", d.runs.batter)
        .create_prop("runs_extras", d.runs.extras)
        .create_prop("runs_total", d.runs.total)
        .create_prop("extras_type", d.extras.primary_kind())
        .create_prop("wides", d.extras.wides)
        .create_prop("noballs", d.extras.noballs)
        .create_prop("byes", d.extras.byes)
        .create_prop("legbyes", d.extras.legbyes)
        .create_prop("penalty", d.extras.penalty)
        .create_prop("is_wicket", wicket.is_some())
        .create_prop("wicket_kind", wicket.and_then(|w| w.kind.clone()))
        .create_prop("is_boundary", d.runs.batter == 4 && !d.runs.non_boundary)
        .create_prop("is_six", d.runs.batter == 6 && !d.runs.non_boundary)
        .create_prop("is_non_boundary", d.runs.non_boundary)
        .create_prop("review_by", review.and_then(|r| r.by.clone()))
        .create_prop("review_umpire", review.and_then(|r| r.umpire.clone()))
        .create_prop("review_batter", review.and_then(|r| r.batter.clone()))
        .create_prop("review_decision", review.and_then(|r| r.decision.clone()))
        .create_prop("review_type", review.and_then(|r| r.kind.clone()))
        .create_prop("umpires_call", review.and_then(|r| r.umpires_call))
}

fn fielding_edge_type(kind: Option<&str>) -> Option<EdgeType> {
    match kind? {
        "caught" => Some(EdgeType::CaughtBy),
        "stumped" => Some(EdgeType::StumpedBy),
        "run out" => Some(EdgeType::RunOutBy),
        _ => None,
    }
}

fn add_delivery_edges(
    batch: &mut GraphBatch,
    id: &str,
    d: &DeliveryRecord,
    pos: &BallPosition<'_>,
    ctx: &MatchContext<'_>,
) {
    let registry = &ctx.registry;
    batch.add_edge(
        EdgeType::HasDelivery,
        EdgeRow::new(pos.over_id, id).prop("position", pos.ball_in_over),
    );

    let participants = [
        (EdgeType::BowledBy, d.bowler.as_deref()),
        (EdgeType::FacedBy, d.batter.as_deref()),
        (EdgeType::NonStriker, d.non_striker.as_deref()),
    ];
    for (edge_type, name) in participants {
        if let Some(player_id) = registry.resolve(name) {
            batch.add_edge(edge_type, EdgeRow::new(id, player_id));
        }
    }

    // A delivery records at most one wicket; later entries are ignored.
    if let Some(wicket) = d.wickets.first() {
        if let Some(out_id) = registry.resolve(wicket.player_out.as_deref()) {
            batch.add_edge(
                EdgeType::Dismissed,
                EdgeRow::new(id, out_id).prop("kind", wicket.kind.clone()),
            );
        }
        if let Some(edge_type) = fielding_edge_type(wicket.kind.as_deref()) {
            for fielder in &wicket.fielders {
                if let Some(fielder_id) = registry.resolve(fielder.name.as_deref()) {
                    batch.add_edge(
                        edge_type,
                        EdgeRow::new(id, fielder_id).prop("substitute", fielder.substitute),
                    );
                }
            }
        }
    }

    let subs = d.replacements.iter().flat_map(|r| r.match_subs.iter());
    for sub in subs {
        let context = |row: EdgeRow| {
            row.prop("match_id", ctx.match_id)
                .prop("reason", sub.reason.clone())
                .prop("team", sub.team.clone())
                .prop("over", pos.over_number)
                .prop("delivery", pos.delivery_number)
        };
        if let Some(in_id) = registry.resolve(sub.player_in.as_deref()) {
            batch.add_edge(
                EdgeType::ImpactSubIn,
                context(EdgeRow::new(in_id, ctx.match_id)).prop("replaced_player", sub.player_out.clone()),
            );
        }
        if let Some(out_id) = registry.resolve(sub.player_out.as_deref()) {
            batch.add_edge(
                EdgeType::ImpactSubOut,
                context(EdgeRow::new(out_id, ctx.match_id)).prop("replaced_by", sub.player_in.clone()),
            );
        }
    }
}

/// Adds every over of one innings. Deliveries of an over form a single node batch.
pub fn add_overs(
    batch: &mut GraphBatch,
    innings: &InningsRecord,
    innings_number: usize,
    innings_id: &str,
    ctx: &MatchContext<'_>,
) {
    let mut delivery_number = 0;

    for (index, over) in innings.overs.iter().enumerate() {
        let over_number = over.over.unwrap_or(index as i64);
        let over_id = over_id(innings_id, over_number);

        batch.add_node(
            NodeLabel::Over,
            NodeRow::new(over_id.as_str())
                .set_prop("innings_id", innings_id)
                .set_prop("match_id", ctx.match_id)
                .set_prop("over_number", over_number),
        );
        batch.add_edge(
            EdgeType::HasOver,
            EdgeRow::new(innings_id, over_id.as_str()).prop("over_number", over_number),
        );

        let powerplay = powerplay_for_over(&innings.powerplays, over_number);
        let mut nodes = NodeBatch::new(NodeLabel::Delivery);
        for (ball_index, delivery) in over.deliveries.iter().enumerate() {
            delivery_number += 1;
            let pos = BallPosition {
                innings_id,
                innings_number,
                over_id: &over_id,
                over_number,
                ball_in_over: ball_index + 1,
                delivery_number,
                powerplay,
            };
            let id = delivery_id(&over_id, pos.ball_in_over);
            nodes.push(delivery_node(&id, delivery, &pos, ctx.match_id));
            add_delivery_edges(batch, &id, delivery, &pos, ctx);
        }
        batch.add_nodes(nodes);
    }
}
