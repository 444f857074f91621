//! Whole-run behaviour of the importer against on-disk sources and store.

use anyhow::Result;
use cricetl::report;
use cricetl::tracker::{CompletenessTracker, MatchStatus};
use cricfetcher::{build_match_graph, MatchRecord};
use cricstore::graph::{EdgeQuery, GraphStore, PropertyFilter};
use cricstore::schema::{EdgeType, NodeLabel};
use std::sync::Arc;

mod common;
mod support;

use support::fixture::{player_id, MatchFixture};

fn edge_total(graph: &dyn GraphStore) -> Result<u64> {
    let kinds = [
        EdgeType::PlayedIn,
        EdgeType::HeldAt,
        EdgeType::TeamInvolved,
        EdgeType::WonBy,
        EdgeType::TossWonBy,
        EdgeType::HasInnings,
        EdgeType::BattingTeam,
        EdgeType::HasOver,
        EdgeType::HasDelivery,
        EdgeType::BowledBy,
        EdgeType::FacedBy,
        EdgeType::NonStriker,
    ];
    let mut total = 0;
    for kind in kinds {
        total += graph.count_edges(&EdgeQuery::new(kind))?;
    }
    Ok(total)
}

#[tokio::test]
async fn reimporting_a_match_leaves_the_graph_unchanged() -> Result<()> {
    let ctx = common::init_test_context().await?;
    let document = MatchFixture::new(2019, "2019-04-01", "Mumbai Indians", "Chennai Super Kings")
        .won_by_runs("Mumbai Indians", 5)
        .standard_innings()
        .build();
    ctx.write_match("1001", &document).await?;

    let (pipeline, summary) = ctx.run_once().await?;
    assert_eq!(summary.imported, 1);
    let graph = Arc::clone(&pipeline.store().graph);
    let before = (report::summary(graph.as_ref())?, edge_total(graph.as_ref())?);

    let record = MatchRecord::from_slice(&serde_json::to_vec(&document)?)?;
    let batch = build_match_graph(&record, "1001");
    let flushed = pipeline.store().writer.flush(&batch)?;
    assert_eq!(flushed.nodes.created, 0);
    assert_eq!(flushed.edges.created, 0);

    let after = (report::summary(graph.as_ref())?, edge_total(graph.as_ref())?);
    assert_eq!(before, after);
    assert_eq!(after.0.deliveries, 24);
    Ok(())
}

#[tokio::test]
async fn resumed_run_imports_only_the_remaining_matches() -> Result<()> {
    let ctx = common::init_test_context().await?;
    for (id, date) in [("1", "2019-04-01"), ("2", "2019-04-03")] {
        let doc = MatchFixture::new(2019, date, "A", "B").won_by_runs("A", 1).standard_innings().build();
        ctx.write_match(id, &doc).await?;
    }
    let (first, summary) = ctx.run_once().await?;
    assert_eq!(summary.imported, 2);
    let first_match = first.store().graph.get_node(NodeLabel::Match, "1")?.unwrap();
    drop(first);

    let doc = MatchFixture::new(2019, "2019-04-05", "A", "B").won_by_runs("B", 3).standard_innings().build();
    ctx.write_match("3", &doc).await?;
    let (second, summary) = ctx.run_once().await?;
    assert_eq!(summary.already_imported, 2);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 0);

    let graph = &second.store().graph;
    assert_eq!(graph.count_nodes(NodeLabel::Match, None)?, 3);
    assert_eq!(graph.get_node(NodeLabel::Match, "1")?.unwrap(), first_match);
    assert_eq!(
        graph.count_nodes(NodeLabel::Delivery, Some(&PropertyFilter::eq("match_id", "1")))?,
        24
    );
    Ok(())
}

#[tokio::test]
async fn partial_match_is_repaired_on_the_next_run() -> Result<()> {
    let ctx = common::init_test_context().await?;
    let doc = MatchFixture::new(2020, "2020-10-01", "A", "B").won_by_runs("A", 9).standard_innings().build();
    ctx.write_match("77", &doc).await?;
    let (pipeline, _) = ctx.run_once().await?;

    let graph = Arc::clone(&pipeline.store().graph);
    graph.delete_nodes(NodeLabel::Delivery, &PropertyFilter::eq("match_id", "77"))?;
    let tracker = CompletenessTracker::new(Arc::clone(&graph));
    assert_eq!(tracker.status("77")?, MatchStatus::Partial);
    drop(pipeline);

    let (pipeline, summary) = ctx.run_once().await?;
    assert_eq!(summary.repaired, vec!["77".to_string()]);
    assert_eq!(summary.imported, 1);

    let graph = &pipeline.store().graph;
    let tracker = CompletenessTracker::new(Arc::clone(graph));
    assert_eq!(tracker.status("77")?, MatchStatus::Complete);
    // Two innings of two six-ball overs.
    assert_eq!(
        graph.count_nodes(NodeLabel::Delivery, Some(&PropertyFilter::eq("match_id", "77")))?,
        24
    );
    assert_eq!(graph.count_edges(&EdgeQuery::new(EdgeType::HasInnings).from("77"))?, 2);
    Ok(())
}

#[tokio::test]
async fn split_year_and_canonical_seasons_share_one_node() -> Result<()> {
    let ctx = common::init_test_context().await?;
    let first = MatchFixture::new("2007/08", "2008-04-18", "A", "B").won_by_runs("A", 1).standard_innings().build();
    let second = MatchFixture::new(2008, "2008-04-19", "A", "B").won_by_runs("B", 1).standard_innings().build();
    ctx.write_match("1", &first).await?;
    ctx.write_match("2", &second).await?;

    let (pipeline, _) = ctx.run_once().await?;
    let graph = &pipeline.store().graph;
    assert_eq!(graph.count_nodes(NodeLabel::Season, None)?, 1);
    assert_eq!(graph.count_edges(&EdgeQuery::new(EdgeType::PlayedIn).to("2008"))?, 2);
    Ok(())
}

#[tokio::test]
async fn three_matches_two_teams_two_seasons() -> Result<()> {
    let ctx = common::init_test_context().await?;
    let matches = [
        ("501", 2019, "2019-04-01", "Mumbai Indians"),
        ("502", 2019, "2019-05-01", "Chennai Super Kings"),
        ("601", 2020, "2020-10-01", "Mumbai Indians"),
    ];
    for (id, season, date, winner) in matches {
        let doc = MatchFixture::new(season, date, "Mumbai Indians", "Chennai Super Kings")
            .won_by_runs(winner, 10)
            .standard_innings()
            .build();
        ctx.write_match(id, &doc).await?;
    }

    let (pipeline, summary) = ctx.run_once().await?;
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.graph.teams, 2);
    assert_eq!(summary.graph.seasons, 2);
    assert_eq!(summary.graph.matches, 3);
    assert_eq!(summary.aggregation.matches, 3);

    let graph = pipeline.store().graph.as_ref();
    let h2h = report::head_to_head(graph, "Mumbai Indians", "Chennai Super Kings")?;
    assert_eq!(h2h.total_matches, 3);
    assert_eq!(h2h.team1_wins + h2h.team2_wins, 3);
    assert_eq!((h2h.team1_wins, h2h.team2_wins), (2, 1));

    let opener = player_id("Mumbai Indians Opener");
    assert_eq!(
        graph.count_edges(&EdgeQuery::new(EdgeType::BattingStats).from(opener.as_str()))?,
        3
    );
    Ok(())
}

#[tokio::test]
async fn corrected_no_result_drops_the_old_winner() -> Result<()> {
    let ctx = common::init_test_context().await?;
    let won = MatchFixture::new(2021, "2021-04-09", "A", "B").won_by_runs("A", 7).standard_innings().build();
    ctx.write_match("880", &won).await?;
    let (pipeline, _) = ctx.run_once().await?;
    let graph = pipeline.store().graph.as_ref();
    assert_eq!(graph.count_edges(&EdgeQuery::new(EdgeType::WonBy).from("880"))?, 1);

    let corrected = MatchFixture::new(2021, "2021-04-09", "A", "B").standard_innings().build();
    let record = MatchRecord::from_slice(&serde_json::to_vec(&corrected)?)?;
    let flushed = pipeline.store().writer.flush(&build_match_graph(&record, "880"))?;
    assert_eq!(flushed.cleared, 1);

    assert_eq!(graph.count_edges(&EdgeQuery::new(EdgeType::WonBy).from("880"))?, 0);
    let h2h = report::head_to_head(graph, "A", "B")?;
    assert_eq!(h2h.total_matches, 1);
    assert_eq!((h2h.team1_wins, h2h.team2_wins, h2h.no_result), (0, 0, 1));
    Ok(())
}

#[tokio::test]
async fn bad_files_are_logged_and_skipped() -> Result<()> {
    let ctx = common::init_test_context().await?;
    ctx.write_raw("900.json", "{ not json").await?;
    let doc = MatchFixture::new(2021, "2021-04-09", "A", "B")
        .won_by_runs("A", 2)
        .with_info_field("supersub", serde_json::json!("X"))
        .standard_innings()
        .build();
    ctx.write_match("901", &doc).await?;

    let (pipeline, summary) = ctx.run_once().await?;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.imported, 1);

    let errors = tokio::fs::read_to_string(pipeline.store().error_log.path()).await?;
    assert!(errors.contains(" - 900.json: "));
    let unmapped = tokio::fs::read_to_string(pipeline.store().unmapped_log.path()).await?;
    assert!(unmapped.contains("Match ID: 901"));
    assert!(unmapped.contains("  - info.supersub\n"));
    Ok(())
}
