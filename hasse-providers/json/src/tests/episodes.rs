use hasse_core::{MatrixSource, consensus_matrix};
use rstest::{fixture, rstest};

use super::json_file;
use crate::{EpisodeOptions, JsonProviderError, episodes_from_str, load_episodes};

#[fixture]
fn sessions() -> &'static str {
    r#"[
        {
            "M_c": [[1, 1, 1], [0, 1, 1], [0, 0, 1]],
            "P": { "login": [1], "query": [2], "logout": [3] }
        },
        {
            "M_c": [[1, 0, 1], [0, 1, 0], [0, 0, 1]],
            "P": { "login": [1], "query": [], "logout": [2] }
        },
        {
            "M_c": [[1, 0, 0], [1, 1, 0], [0, 0, 1]],
            "P": { "query": [1], "login": [2], "logout": [] }
        }
    ]"#
}

#[rstest]
fn first_record_fixes_the_event_order(sessions: &str) {
    let family =
        episodes_from_str("sessions", sessions, EpisodeOptions::new()).expect("valid episodes");
    let events: Vec<&str> = family.events().events().iter().map(AsRef::as_ref).collect();
    assert_eq!(events, vec!["login", "query", "logout"]);

    // The third record lists `query` first but is still stored by name.
    let third = &family.episodes()[2];
    assert_eq!(third.positions(0).map(|p| p.iter().copied().collect::<Vec<_>>()), Some(vec![2]));
    assert_eq!(third.positions(1).map(|p| p.iter().copied().collect::<Vec<_>>()), Some(vec![1]));
}

#[rstest]
#[case::kept(false, 6)]
#[case::stripped(true, 3)]
fn diagonal_handling_is_optional(sessions: &str, #[case] strip: bool, #[case] relations: u64) {
    let options = EpisodeOptions::new().with_strip_diagonal(strip);
    let family = episodes_from_str("sessions", sessions, options).expect("valid episodes");
    assert_eq!(family.matrix(0).expect("in range").relation_count(), relations);
}

#[rstest]
fn loaded_positions_drive_consensus(sessions: &str) {
    let family = episodes_from_str(
        "sessions",
        sessions,
        EpisodeOptions::new().with_strip_diagonal(true),
    )
    .expect("valid episodes");
    let group: Vec<_> = family.episodes().iter().collect();
    let consensus = consensus_matrix(&group).expect("non-empty group");

    // login -> query is contradicted by the third session.
    assert_eq!(consensus.get(0, 1), Some(0));
    assert_eq!(consensus.get(0, 2), Some(1));
    assert_eq!(consensus.get(1, 2), Some(1));
    assert_eq!(consensus.relation_count(), 2);
}

#[rstest]
fn episode_files_load_from_disk(sessions: &str) {
    let file = json_file(sessions);
    let family = load_episodes(file.path(), EpisodeOptions::new()).expect("file loads");
    assert_eq!(family.len(), 3);
}

#[rstest]
#[case::missing_event(
    r#"[{ "M_c": [[0, 1], [0, 0]], "P": { "a": [1], "b": [2] } },
        { "M_c": [[0, 1], [0, 0]], "P": { "a": [1] } }]"#
)]
#[case::renamed_event(
    r#"[{ "M_c": [[0, 1], [0, 0]], "P": { "a": [1], "b": [2] } },
        { "M_c": [[0, 1], [0, 0]], "P": { "a": [1], "c": [2] } }]"#
)]
fn records_must_track_the_same_events(#[case] json: &str) {
    let err = episodes_from_str("odd", json, EpisodeOptions::new()).expect_err("events differ");
    assert!(matches!(err, JsonProviderError::EventMismatch { index: 1 }));
}

#[rstest]
#[case::zero(r#"[{ "M_c": [[0]], "P": { "a": [0] } }]"#)]
#[case::negative(r#"[{ "M_c": [[0]], "P": { "a": [-2] } }]"#)]
#[case::scalar(r#"[{ "M_c": [[0]], "P": { "a": 1 } }]"#)]
fn positions_must_be_term_indices(#[case] json: &str) {
    let err = episodes_from_str("odd", json, EpisodeOptions::new()).expect_err("bad positions");
    assert!(matches!(
        err,
        JsonProviderError::InvalidPositions { index: 0, ref event } if event == "a"
    ));
}

#[rstest]
fn matrix_order_must_match_the_event_count() {
    let json = r#"[{ "M_c": [[0, 1], [0, 0]], "P": { "a": [1], "b": [2], "c": [3] } }]"#;
    let err = episodes_from_str("odd", json, EpisodeOptions::new()).expect_err("order 2 vs 3");
    match err {
        JsonProviderError::Core(core) => {
            assert_eq!(core.code().as_str(), "HASSE_DIMENSION_MISMATCH");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn empty_episode_lists_are_rejected() {
    let err = episodes_from_str("none", "[]", EpisodeOptions::new()).expect_err("no records");
    assert!(matches!(err, JsonProviderError::Empty));
}
