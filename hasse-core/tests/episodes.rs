//! Episode encoding, consensus and clustering of episode families.

use hasse_core::{
    ClusteringStatus, Episode, EpisodeFamily, EventOrder, HasseBuilder, MatrixFamily,
    MatrixSource, RelationMatrix, consensus_matrix,
};
use rstest::{fixture, rstest};

#[fixture]
fn order() -> EventOrder {
    EventOrder::try_new(["boot", "login", "query", "logout"]).expect("distinct events")
}

fn encode(order: &EventOrder, episodes: &[&[&[&str]]]) -> Vec<Episode> {
    episodes
        .iter()
        .map(|terms| {
            let terms: Vec<Vec<&str>> = terms.iter().map(|term| term.to_vec()).collect();
            order.episode(&terms)
        })
        .collect()
}

#[rstest]
fn repeated_events_relate_only_when_every_occurrence_precedes(order: EventOrder) {
    let episodes = encode(
        &order,
        &[&[&["boot"], &["login", "query"], &["query"], &["logout"]]],
    );
    let matrix = episodes[0].matrix();

    assert_eq!(matrix.get(0, 1), Some(1));
    assert_eq!(matrix.get(0, 3), Some(1));
    // login shares term 2 with query, so neither precedes the other.
    assert_eq!(matrix.get(1, 2), Some(0));
    assert_eq!(matrix.get(2, 1), Some(0));
    assert_eq!(matrix.get(2, 3), Some(1));
    assert_eq!(matrix.relation_count(), 5);
    let query: Vec<usize> = episodes[0]
        .positions(2)
        .expect("query is tracked")
        .iter()
        .copied()
        .collect();
    assert_eq!(query, vec![2, 3]);
}

#[rstest]
fn consensus_keeps_relations_no_member_contradicts(order: EventOrder) {
    let episodes = encode(
        &order,
        &[
            &[&["boot"], &["login"], &["query"], &["logout"]],
            &[&["boot"], &["query"], &["logout"]],
            &[&["login"], &["boot"]],
        ],
    );
    let group: Vec<&Episode> = episodes.iter().collect();
    let consensus = consensus_matrix(&group).expect("non-empty group");

    // boot/login is contradicted by the third episode.
    assert_eq!(consensus.get(0, 1), Some(0));
    assert_eq!(consensus.get(1, 0), Some(0));
    // login/query is only observed once and never contradicted.
    assert_eq!(consensus.get(1, 2), Some(1));
    assert_eq!(consensus.get(0, 2), Some(1));
    assert_eq!(consensus.get(2, 3), Some(1));
    assert_eq!(consensus.get(3, 3), Some(0));
}

#[rstest]
fn episode_families_feed_the_pipeline(order: EventOrder) {
    let episodes = encode(
        &order,
        &[
            &[&["boot"], &["login"], &["query"], &["logout"]],
            &[&["boot"], &["login"], &["logout"]],
            &[&["boot"], &["query"]],
            &[&["boot"]],
        ],
    );
    let family = EpisodeFamily::try_new("sessions", order, episodes).expect("orders agree");
    assert_eq!(family.len(), 4);

    let universe = MatrixFamily::try_new(
        "universe",
        family
            .matrices()
            .expect("in range")
            .into_iter()
            .cloned()
            .collect::<Vec<RelationMatrix>>(),
    )
    .expect("shared order");
    let hasse = HasseBuilder::new().build().expect("defaults are valid");
    let analysis = hasse
        .analyze_with_entities(&universe, &family)
        .expect("every episode is in the universe");
    // Full session above two partial ones above the bare boot.
    assert_eq!(analysis.reduced().edge_count(), 4);

    let clustering = hasse.cluster(&analysis, None).expect("clustering runs");
    assert_eq!(clustering.status(), ClusteringStatus::Complete);
    let sizes: Vec<usize> = clustering.linkage().iter().map(|step| step.size).collect();
    assert_eq!(sizes, vec![2, 2, 4]);
    let last = clustering.linkage().last().expect("three merges");
    assert_eq!(last.representative.get(), 3);

    let consensus = family.consensus([0, 1]).expect("members exist");
    assert_eq!(consensus.get(0, 1), Some(1));
    assert_eq!(consensus.get(2, 3), Some(1));
}

#[rstest]
fn family_rejects_foreign_episodes(order: EventOrder) {
    let stray = Episode::from_parts(
        RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]]).expect("square"),
        vec![Default::default(), Default::default()],
    )
    .expect("positions match the matrix");
    let err = EpisodeFamily::try_new("mixed", order, vec![stray]).expect_err("order 2 vs 4");
    assert_eq!(err.code().as_str(), "HASSE_DIMENSION_MISMATCH");
}
