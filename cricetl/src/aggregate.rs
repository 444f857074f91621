//! Per-match batting, bowling and partnership figures derived from Delivery
//! nodes only. Innings running totals are never read.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use cricstore::batch::{EdgeBatch, EdgeRow};
use cricstore::errors::Result;
use cricstore::graph::{EdgeQuery, GraphStore, PropertyFilter};
use cricstore::models::NodeRecord;
use cricstore::schema::{EdgeType, NodeLabel};
use serde::Serialize;
use tracing::{info, warn};

/// Dismissal kinds not credited to the bowler.
const NON_BOWLER_DISMISSALS: &[&str] = &[
    "run out",
    "retired hurt",
    "retired out",
    "retired not out",
    "obstructing the field",
];

/// One delivery joined with the players involved in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BallFact {
    pub delivery_id: String,
    pub innings_id: String,
    pub over_id: String,
    pub delivery_number: i64,
    pub runs_batter: i64,
    pub runs_total: i64,
    pub wides: i64,
    pub noballs: i64,
    pub is_wicket: bool,
    pub wicket_kind: Option<String>,
    pub is_boundary: bool,
    pub is_six: bool,
    pub batter: Option<String>,
    pub bowler: Option<String>,
    pub non_striker: Option<String>,
    /// Player dismissed on this delivery.
    pub dismissed: Option<String>,
}

impl BallFact {
    fn from_node(node: &NodeRecord) -> Self {
        Self {
            delivery_id: node.key.clone(),
            innings_id: node.str_prop("innings_id").unwrap_or_default().to_string(),
            over_id: node.str_prop("over_id").unwrap_or_default().to_string(),
            delivery_number: node.i64_prop("delivery_number").unwrap_or_default(),
            runs_batter: node.i64_prop("runs_batter").unwrap_or_default(),
            runs_total: node.i64_prop("runs_total").unwrap_or_default(),
            wides: node.i64_prop("wides").unwrap_or_default(),
            noballs: node.i64_prop("noballs").unwrap_or_default(),
            is_wicket: node.bool_prop("is_wicket"),
            wicket_kind: node.str_prop("wicket_kind").map(str::to_string),
            is_boundary: node.bool_prop("is_boundary"),
            is_six: node.bool_prop("is_six"),
            ..Default::default()
        }
    }

    fn is_wide(&self) -> bool {
        self.wides > 0
    }

    fn is_legal(&self) -> bool {
        self.wides == 0 && self.noballs == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BattingLine {
    pub player_id: String,
    pub runs: i64,
    pub balls: i64,
    pub fours: i64,
    pub sixes: i64,
    pub dots: i64,
    pub strike_rate: f64,
    pub dismissal_type: Option<String>,
    pub out: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BowlingLine {
    pub player_id: String,
    pub overs: f64,
    /// Completed overs plus tenths for the remaining legal balls.
    pub overs_completed: f64,
    pub overs_touched: i64,
    pub balls: i64,
    pub runs_conceded: i64,
    pub wickets: i64,
    pub bowler_wickets: i64,
    pub economy: f64,
    pub dots: i64,
    pub fours_conceded: i64,
    pub sixes_conceded: i64,
    pub strike_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartnershipLine {
    pub innings_id: String,
    pub batter: String,
    pub non_striker: String,
    pub runs: i64,
    pub balls: i64,
    pub wicket_ended: bool,
    pub first_delivery: i64,
    pub last_delivery: i64,
}

/// Balls are expected in delivery order.
pub fn batting_lines(balls: &[BallFact]) -> Vec<BattingLine> {
    let mut lines: BTreeMap<&str, BattingLine> = BTreeMap::new();

    for ball in balls {
        let Some(batter) = ball.batter.as_deref() else {
            continue;
        };
        let line = lines.entry(batter).or_insert_with(|| BattingLine {
            player_id: batter.to_string(),
            ..Default::default()
        });
        line.runs += ball.runs_batter;
        if ball.is_boundary {
            line.fours += 1;
        }
        if ball.is_six {
            line.sixes += 1;
        }
        if !ball.is_wide() {
            line.balls += 1;
            if ball.runs_batter == 0 {
                line.dots += 1;
            }
        }
    }

    // Dismissals are looked up across the whole match, so a non-striker run out
    // without facing still gets a line.
    for ball in balls {
        let Some(player) = ball.dismissed.as_deref() else {
            continue;
        };
        let line = lines.entry(player).or_insert_with(|| BattingLine {
            player_id: player.to_string(),
            ..Default::default()
        });
        if line.dismissal_type.is_none() {
            line.dismissal_type = ball.wicket_kind.clone();
            line.out = true;
        }
    }

    lines
        .into_values()
        .map(|mut line| {
            line.strike_rate = if line.balls > 0 {
                line.runs as f64 * 100.0 / line.balls as f64
            } else {
                0.0
            };
            line
        })
        .collect()
}

pub fn bowling_lines(balls: &[BallFact]) -> Vec<BowlingLine> {
    let mut lines: BTreeMap<&str, BowlingLine> = BTreeMap::new();
    let mut overs: HashMap<&str, BTreeSet<&str>> = HashMap::new();

    for ball in balls {
        let Some(bowler) = ball.bowler.as_deref() else {
            continue;
        };
        overs.entry(bowler).or_default().insert(ball.over_id.as_str());
        let line = lines.entry(bowler).or_insert_with(|| BowlingLine {
            player_id: bowler.to_string(),
            ..Default::default()
        });

        let conceded = ball.runs_batter + ball.wides + ball.noballs;
        line.runs_conceded += conceded;
        if ball.is_legal() {
            line.balls += 1;
            if conceded == 0 {
                line.dots += 1;
            }
        }
        if ball.is_wicket {
            line.wickets += 1;
            let kind = ball.wicket_kind.as_deref().unwrap_or_default();
            if !NON_BOWLER_DISMISSALS.contains(&kind) {
                line.bowler_wickets += 1;
            }
        }
        if ball.is_boundary {
            line.fours_conceded += 1;
        }
        if ball.is_six {
            line.sixes_conceded += 1;
        }
    }

    lines
        .into_values()
        .map(|mut line| {
            line.overs_touched = overs.get(line.player_id.as_str()).map_or(0, |s| s.len() as i64);
            let part = (line.balls % 6) as f64 / 10.0;
            // Distinct overs bowled plus tenths for the odd legal balls.
            line.overs = line.overs_touched as f64 + part;
            line.overs_completed = (line.balls / 6) as f64 + part;
            line.economy = if line.balls > 0 {
                line.runs_conceded as f64 * 6.0 / line.balls as f64
            } else {
                0.0
            };
            line.strike_rate = if line.wickets > 0 {
                Some(line.balls as f64 / line.wickets as f64)
            } else {
                None
            };
            line
        })
        .collect()
}

/// One line per ordered (striker, non-striker) pair per innings.
pub fn partnership_lines(balls: &[BallFact]) -> Vec<PartnershipLine> {
    let mut lines: BTreeMap<(&str, &str, &str), PartnershipLine> = BTreeMap::new();

    for ball in balls {
        let (Some(batter), Some(non_striker)) = (ball.batter.as_deref(), ball.non_striker.as_deref()) else {
            continue;
        };
        let key = (ball.innings_id.as_str(), batter, non_striker);
        let line = lines.entry(key).or_insert_with(|| PartnershipLine {
            innings_id: ball.innings_id.clone(),
            batter: batter.to_string(),
            non_striker: non_striker.to_string(),
            first_delivery: ball.delivery_number,
            ..Default::default()
        });
        line.runs += ball.runs_total;
        line.balls += 1;
        line.first_delivery = line.first_delivery.min(ball.delivery_number);
        line.last_delivery = line.last_delivery.max(ball.delivery_number);
        if ball.is_wicket && ball.dismissed.as_deref() == Some(batter) {
            line.wicket_ended = true;
        }
    }

    lines.into_values().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchAggregates {
    pub match_id: String,
    pub batting: Vec<BattingLine>,
    pub bowling: Vec<BowlingLine>,
    pub partnerships: Vec<PartnershipLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub matches: usize,
    pub failed: usize,
    pub batting_rows: usize,
    pub bowling_rows: usize,
    pub partnership_rows: usize,
}

pub struct AggregationEngine {
    graph: Arc<dyn GraphStore>,
}

impl AggregationEngine {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Delivery facts of one match in delivery order.
    pub fn load_balls(&self, match_id: &str) -> Result<Vec<BallFact>> {
        let filter = PropertyFilter::eq("match_id", match_id);
        let mut balls: Vec<BallFact> = self
            .graph
            .find_nodes(NodeLabel::Delivery, Some(&filter))?
            .iter()
            .map(BallFact::from_node)
            .collect();
        balls.sort_by(|a, b| {
            (a.innings_id.as_str(), a.delivery_number).cmp(&(b.innings_id.as_str(), b.delivery_number))
        });

        let index: HashMap<String, usize> = balls
            .iter()
            .enumerate()
            .map(|(i, ball)| (ball.delivery_id.clone(), i))
            .collect();
        for edge_type in [
            EdgeType::FacedBy,
            EdgeType::BowledBy,
            EdgeType::NonStriker,
            EdgeType::Dismissed,
        ] {
            let query = EdgeQuery::new(edge_type).with_from_property(filter.clone());
            for edge in self.graph.find_edges(&query)? {
                let Some(&i) = index.get(&edge.from_key) else {
                    continue;
                };
                let slot = match edge_type {
                    EdgeType::FacedBy => &mut balls[i].batter,
                    EdgeType::BowledBy => &mut balls[i].bowler,
                    EdgeType::NonStriker => &mut balls[i].non_striker,
                    _ => &mut balls[i].dismissed,
                };
                *slot = Some(edge.to_key);
            }
        }
        Ok(balls)
    }

    pub fn compute(&self, match_id: &str) -> Result<MatchAggregates> {
        let balls = self.load_balls(match_id)?;
        Ok(MatchAggregates {
            match_id: match_id.to_string(),
            batting: batting_lines(&balls),
            bowling: bowling_lines(&balls),
            partnerships: partnership_lines(&balls),
        })
    }

    /// Replaces the derived relationships of one match.
    pub fn store(&self, aggregates: &MatchAggregates) -> Result<()> {
        let match_id = aggregates.match_id.as_str();
        self.graph
            .delete_edges(&EdgeQuery::new(EdgeType::BattingStats).to(match_id))?;
        self.graph
            .delete_edges(&EdgeQuery::new(EdgeType::BowlingStats).to(match_id))?;
        self.graph.delete_edges(
            &EdgeQuery::new(EdgeType::Partnership)
                .with_property(PropertyFilter::eq("match_id", match_id)),
        )?;

        let batting = aggregates
            .batting
            .iter()
            .map(|line| {
                EdgeRow::new(line.player_id.as_str(), match_id)
                    .prop("runs", line.runs)
                    .prop("balls", line.balls)
                    .prop("fours", line.fours)
                    .prop("sixes", line.sixes)
                    .prop("dots", line.dots)
                    .prop("strike_rate", line.strike_rate)
                    .prop("dismissal_type", line.dismissal_type.clone())
                    .prop("out", line.out)
            })
            .collect();
        self.graph
            .merge_edges(&EdgeBatch::with_rows(EdgeType::BattingStats, batting))?;

        let bowling = aggregates
            .bowling
            .iter()
            .map(|line| {
                EdgeRow::new(line.player_id.as_str(), match_id)
                    .prop("overs", line.overs)
                    .prop("overs_completed", line.overs_completed)
                    .prop("overs_touched", line.overs_touched)
                    .prop("balls", line.balls)
                    .prop("runs_conceded", line.runs_conceded)
                    .prop("wickets", line.wickets)
                    .prop("bowler_wickets", line.bowler_wickets)
                    .prop("economy", line.economy)
                    .prop("dots", line.dots)
                    .prop("fours_conceded", line.fours_conceded)
                    .prop("sixes_conceded", line.sixes_conceded)
                    .prop("strike_rate", line.strike_rate)
            })
            .collect();
        self.graph
            .merge_edges(&EdgeBatch::with_rows(EdgeType::BowlingStats, bowling))?;

        let partnerships = aggregates
            .partnerships
            .iter()
            .map(|line| {
                EdgeRow::new(line.batter.as_str(), line.non_striker.as_str())
                    .prop("match_id", match_id)
                    .prop("innings_id", line.innings_id.as_str())
                    .prop("runs", line.runs)
                    .prop("balls", line.balls)
                    .prop("wicket_ended", line.wicket_ended)
                    .prop("first_delivery", line.first_delivery)
                    .prop("last_delivery", line.last_delivery)
            })
            .collect();
        self.graph
            .merge_edges(&EdgeBatch::with_rows(EdgeType::Partnership, partnerships))?;
        Ok(())
    }

    /// Matches that have deliveries but no batting figures yet.
    pub fn matches_missing_stats(&self) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for node in self.graph.find_nodes(NodeLabel::Match, None)? {
            let with_stats = self
                .graph
                .count_edges(&EdgeQuery::new(EdgeType::BattingStats).to(node.key.as_str()))?;
            if with_stats > 0 {
                continue;
            }
            let deliveries = self.graph.count_nodes(
                NodeLabel::Delivery,
                Some(&PropertyFilter::eq("match_id", node.key.as_str())),
            )?;
            if deliveries > 0 {
                missing.push(node.key);
            }
        }
        Ok(missing)
    }

    /// Recomputes every listed match. A failing match is logged and skipped.
    pub fn run(&self, match_ids: &[String]) -> AggregationReport {
        let mut report = AggregationReport::default();
        for match_id in match_ids {
            match self.compute(match_id).and_then(|agg| {
                self.store(&agg)?;
                Ok(agg)
            }) {
                Ok(agg) => {
                    report.matches += 1;
                    report.batting_rows += agg.batting.len();
                    report.bowling_rows += agg.bowling.len();
                    report.partnership_rows += agg.partnerships.len();
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(match_id = %match_id, error = %err, "Failed to compute stats");
                }
            }
        }
        info!(
            matches = report.matches,
            failed = report.failed,
            "Computed aggregated statistics"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(n: i64, batter: &str, bowler: &str, runs: i64) -> BallFact {
        BallFact {
            delivery_id: format!("d{n}"),
            innings_id: "m_innings_1".into(),
            over_id: format!("o{}", (n - 1) / 6),
            delivery_number: n,
            runs_batter: runs,
            runs_total: runs,
            is_boundary: runs == 4,
            is_six: runs == 6,
            batter: Some(batter.into()),
            bowler: Some(bowler.into()),
            non_striker: Some("ns".into()),
            ..Default::default()
        }
    }

    #[test]
    fn wides_do_not_count_as_balls_faced() {
        let mut wide = ball(2, "a", "x", 0);
        wide.wides = 1;
        wide.runs_total = 1;
        let balls = vec![ball(1, "a", "x", 4), wide];

        let batting = batting_lines(&balls);
        assert_eq!(batting[0].balls, 1);
        assert_eq!(batting[0].strike_rate, 400.0);

        let bowling = bowling_lines(&balls);
        assert_eq!(bowling[0].balls, 1);
        assert_eq!(bowling[0].runs_conceded, 5);
        assert_eq!(bowling[0].economy, 30.0);
    }

    #[test]
    fn unfaced_dismissal_gets_zero_strike_rate() {
        let mut run_out = ball(1, "a", "x", 0);
        run_out.is_wicket = true;
        run_out.wicket_kind = Some("run out".into());
        run_out.dismissed = Some("ns".into());

        let batting = batting_lines(&[run_out.clone()]);
        let ns = batting.iter().find(|l| l.player_id == "ns").unwrap();
        assert_eq!(ns.balls, 0);
        assert_eq!(ns.strike_rate, 0.0);
        assert!(ns.out);
        assert_eq!(ns.dismissal_type.as_deref(), Some("run out"));

        let bowling = bowling_lines(&[run_out]);
        assert_eq!(bowling[0].wickets, 1);
        assert_eq!(bowling[0].bowler_wickets, 0);
    }

    #[test]
    fn wicketless_bowler_has_no_strike_rate() {
        let balls: Vec<_> = (1..=6).map(|n| ball(n, "a", "x", 1)).collect();
        let bowling = bowling_lines(&balls);
        assert_eq!(bowling[0].strike_rate, None);
        assert_eq!(bowling[0].overs, 1.0);
        assert_eq!(bowling[0].overs_touched, 1);
        assert_eq!(bowling[0].economy, 6.0);
    }

    #[test]
    fn partial_overs_use_tenths() {
        let balls: Vec<_> = (1..=8).map(|n| ball(n, "a", "x", 0)).collect();
        let bowling = bowling_lines(&balls);
        assert_eq!(bowling[0].balls, 8);
        assert_eq!(bowling[0].overs_touched, 2);
        assert!((bowling[0].overs - 2.2).abs() < 1e-9);
        assert!((bowling[0].overs_completed - 1.2).abs() < 1e-9);
        assert_eq!(bowling[0].dots, 8);
    }

    #[test]
    fn overs_count_every_over_touched() {
        // A full over, then three balls of a later over.
        let mut balls: Vec<_> = (1..=6).map(|n| ball(n, "a", "x", 1)).collect();
        for n in 13..=15 {
            balls.push(ball(n, "a", "x", 0));
        }
        let bowling = bowling_lines(&balls);
        assert_eq!(bowling[0].balls, 9);
        assert_eq!(bowling[0].overs_touched, 2);
        assert!((bowling[0].overs - 2.3).abs() < 1e-9);
        assert!((bowling[0].overs_completed - 1.3).abs() < 1e-9);
    }

    #[test]
    fn partnerships_are_ordered_pairs() {
        let mut balls = vec![ball(1, "a", "x", 1), ball(2, "ns", "x", 2), ball(3, "a", "x", 0)];
        balls[1].non_striker = Some("a".into());
        balls[2].is_wicket = true;
        balls[2].wicket_kind = Some("bowled".into());
        balls[2].dismissed = Some("a".into());

        let lines = partnership_lines(&balls);
        assert_eq!(lines.len(), 2);
        let a_ns = lines.iter().find(|l| l.batter == "a").unwrap();
        assert_eq!((a_ns.runs, a_ns.balls), (1, 2));
        assert!(a_ns.wicket_ended);
        assert_eq!((a_ns.first_delivery, a_ns.last_delivery), (1, 3));
        let ns_a = lines.iter().find(|l| l.batter == "ns").unwrap();
        assert!(!ns_a.wicket_ended);
        assert_eq!(ns_a.runs, 2);
    }
}
