//! Unit tests for the CLI commands and report rendering.

use super::test_helpers::{
    DIAMOND, EPISODES, arg, create_file, parse, report, run, run_expecting_error, temp_dir,
};
use super::{Cli, CliError, Command, CoverCommand, OutputFormat, Report, render_summary};

use clap::Parser;
use hasse_core::HasseError;
use hasse_providers_json::JsonProviderError;
use hasse_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing::Level;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[rstest]
fn analyze_reports_the_hasse_diagram() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Analyze(report) = report(&["analyze", &arg(&universe)]) else {
        panic!("analyze must produce an analyze report");
    };

    assert_eq!(report.nodes, 5);
    assert_eq!(report.dominance_edges, 5);
    assert_eq!(report.hasse_edges, vec![(0, 1), (0, 2), (1, 3), (2, 3)]);
    assert_eq!(report.roots, vec![0, 4]);
    assert_eq!(report.entities, 5);
    assert!(report.universal.is_empty());
    let top = report.stats[0];
    assert_eq!((top.direct, top.covered, top.descendants), (1, 4, 3));
    Ok(())
}

#[rstest]
#[case::descendants("descendants", 4, 1)]
#[case::ancestors("ancestors", 1, 4)]
fn coverage_rule_flag_flows_into_the_index(
    #[case] rule: &str,
    #[case] top: usize,
    #[case] bottom: usize,
) -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Analyze(report) = report(&["analyze", &arg(&universe), "--rule", rule]) else {
        panic!("analyze must produce an analyze report");
    };
    assert_eq!(report.stats[0].covered, top);
    assert_eq!(report.stats[3].covered, bottom);
    Ok(())
}

#[rstest]
fn cluster_leaves_the_outlier_apart() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Cluster(report) = report(&["cluster", &arg(&universe)]) else {
        panic!("cluster must produce a cluster report");
    };

    assert_eq!(report.status, "NO_MERGEABLE_CLUSTERS");
    assert_eq!(report.merges.len(), 3);
    let first = report.merges[0];
    assert_eq!((first.left, first.right, first.distance), (0, 1, 1));
    assert_eq!(first.representative, 1);
    assert_eq!(report.labels, vec![0, 0, 0, 0, 1]);
    assert_eq!(report.clusters.len(), 2);
    assert!(report.clusters.iter().all(|cluster| cluster.consensus.is_none()));
    Ok(())
}

#[rstest]
fn cluster_honours_the_iteration_cap() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Cluster(report) =
        report(&["cluster", &arg(&universe), "--iteration-cap", "1"])
    else {
        panic!("cluster must produce a cluster report");
    };
    assert_eq!(report.status, "ITERATION_CAP_REACHED");
    assert_eq!(report.merges.len(), 1);
    assert_eq!(report.clusters.len(), 4);
    Ok(())
}

#[rstest]
fn episode_clusters_carry_their_consensus() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let episodes = create_file(&dir, "sessions.json", EPISODES)?;
    let Report::Cluster(report) = report(&[
        "cluster",
        &arg(&universe),
        "--entities",
        &arg(&episodes),
        "--format",
        "episodes",
    ]) else {
        panic!("cluster must produce a cluster report");
    };

    assert_eq!(report.status, "COMPLETE");
    assert_eq!(report.labels, vec![0, 0]);
    let cluster = &report.clusters[0];
    assert_eq!(cluster.members, vec![0, 1]);
    assert_eq!(cluster.representative, Some(1));
    assert_eq!(
        cluster.consensus,
        Some(vec![vec![0, 1, 1], vec![0, 0, 0], vec![0, 0, 0]])
    );
    Ok(())
}

#[rstest]
fn mis_shaped_path_tables_are_rejected() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let table = create_file(&dir, "paths.json", "[[0, 1], [null, 0]]")?;
    let err = run_expecting_error(
        &["cluster", &arg(&universe), "--paths", &arg(&table)],
        "a two-node table cannot describe five nodes",
    );
    assert_eq!(
        err.core().map(|core| core.code().as_str()),
        Some("HASSE_PATH_TABLE_SHAPE")
    );
    Ok(())
}

#[rstest]
#[case::default_fraction(&[], vec![0])]
#[case::full_cover(&["--fraction", "1.0"], vec![0, 4])]
#[case::excluding_the_top(&["--fraction", "0.8", "--exclude", "0"], vec![1, 2, 4])]
fn greedy_cover_picks_in_gain_order(
    #[case] extra: &[&str],
    #[case] expected: Vec<usize>,
) -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let universe = arg(&universe);
    let mut args = vec!["cover", "greedy", universe.as_str()];
    args.extend_from_slice(extra);
    let Report::Greedy(report) = report(&args) else {
        panic!("cover greedy must produce a greedy report");
    };
    let picks: Vec<usize> = report.steps.iter().map(|step| step.node).collect();
    assert_eq!(picks, expected);
    assert_eq!(report.status, "SATISFIED");
    Ok(())
}

#[rstest]
fn excluded_nodes_must_exist() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let err = run_expecting_error(
        &["cover", "greedy", &arg(&universe), "--exclude", "9"],
        "node 9 is outside the poset",
    );
    assert!(matches!(
        err,
        CliError::Core(HasseError::UnknownNode {
            node: 9,
            node_count: 5,
        })
    ));
    Ok(())
}

#[rstest]
fn exhaustive_cover_finds_the_best_pair() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Exhaustive(report) = report(&[
        "cover",
        "exhaustive",
        &arg(&universe),
        "--fraction",
        "1.0",
        "--max-size",
        "2",
    ]) else {
        panic!("cover exhaustive must produce an exhaustive report");
    };
    assert_eq!(report.searched, 15);
    let best: Vec<Vec<usize>> = report.best.iter().map(|combo| combo.nodes.clone()).collect();
    assert_eq!(best, vec![vec![0, 4]]);
    assert_eq!(report.status, "SATISFIED");
    Ok(())
}

#[rstest]
fn exhaustive_limit_is_enforced() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let err = run_expecting_error(
        &["cover", "exhaustive", &arg(&universe), "--limit", "10"],
        "30 combinations exceed the limit",
    );
    assert_eq!(
        err.core().map(|core| core.code().as_str()),
        Some("HASSE_SEARCH_SPACE_TOO_LARGE")
    );
    Ok(())
}

#[test]
fn exhaustive_search_is_bounded_by_default() {
    let Cli {
        command: Command::Cover(CoverCommand::Exhaustive(args)),
        ..
    } = parse(&["cover", "exhaustive", "u.json"])
    else {
        panic!("cover exhaustive must parse");
    };
    assert_eq!(args.limit, 100_000_000);
    assert_eq!(args.max_size, 4);
}

#[rstest]
fn density_baseline_marks_the_outlier_as_noise() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Density(report) = report(&[
        "baseline",
        "density",
        &arg(&universe),
        "--eps",
        "1",
        "--min-samples",
        "3",
    ]) else {
        panic!("baseline density must produce a density report");
    };
    assert_eq!(report.labels, vec![Some(0), Some(0), Some(0), Some(0), None]);
    assert_eq!(report.noise, vec![4]);
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].members, vec![0, 1, 2, 3]);
    Ok(())
}

#[rstest]
#[case::below_every_merge("0.5", vec![0, 1, 2, 3, 4])]
#[case::pairs_only("1", vec![0, 0, 1, 1, 2])]
#[case::diamond_only("2", vec![0, 0, 0, 0, 1])]
#[case::everything("3", vec![0, 0, 0, 0, 0])]
fn average_baseline_cuts_at_the_requested_height(
    #[case] height: &str,
    #[case] expected: Vec<u64>,
) -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let Report::Average(report) = report(&[
        "baseline",
        "average",
        &arg(&universe),
        "--cut-height",
        height,
    ]) else {
        panic!("baseline average must produce an average report");
    };
    assert_eq!(report.steps.len(), 4);
    assert_eq!(report.labels, expected);
    Ok(())
}

#[rstest]
fn missing_inputs_surface_provider_errors() {
    let dir = temp_dir();
    let missing = dir.path().join("missing.json");
    let err = run_expecting_error(&["analyze", &arg(&missing)], "missing file must fail");
    assert!(matches!(
        err,
        CliError::Provider(JsonProviderError::Io { .. })
    ));
    assert!(err.core().is_none());
}

#[rstest]
fn text_rendering_lists_the_report() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let summary = run(&["cover", "greedy", &arg(&universe), "--fraction", "1.0"])?;
    let mut buffer = Vec::new();
    render_summary(&summary, OutputFormat::Text, &mut buffer)?;
    let text = String::from_utf8(buffer)?;

    assert!(text.contains("data source: diamond"));
    assert!(text.contains("status: SATISFIED"));
    assert!(text.contains("target: 5 of 5 entities"));
    assert!(text.contains("0\t4\t4\t0.8000"));
    assert!(text.contains("4\t1\t5\t1.0000"));
    Ok(())
}

#[rstest]
fn json_rendering_is_tagged_by_command() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let cli = parse(&["--json", "analyze", &arg(&universe)]);
    assert_eq!(cli.output_format(), OutputFormat::Json);
    let summary = super::run_cli(cli)?;

    let mut buffer = Vec::new();
    render_summary(&summary, OutputFormat::Json, &mut buffer)?;
    let value: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(value["data_source"], "diamond");
    assert_eq!(value["report"]["command"], "analyze");
    assert_eq!(value["report"]["roots"], serde_json::json!([0, 4]));
    Ok(())
}

#[rstest]
#[case::paths_with_undirected(&["cluster", "u.json", "--undirected", "--paths", "p.json"])]
#[case::unknown_rule(&["analyze", "u.json", "--rule", "sideways"])]
#[case::zero_min_samples(&["baseline", "density", "u.json", "--min-samples", "0"])]
#[case::missing_cover_mode(&["cover", "u.json"])]
fn clap_rejects_invalid_arguments(#[case] args: &[&str]) {
    let argv = std::iter::once("hasse").chain(args.iter().copied());
    assert!(super::Cli::try_parse_from(argv).is_err());
}

#[rstest]
fn commands_emit_tracing_fields() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let universe = arg(&universe);

    let (summary, layer) = RecordingLayer::capture(|| run(&["analyze", &universe]));
    assert_eq!(summary?.data_source, "diamond");

    let run_span = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run_span.field("command"), Some("analyze"));

    let prepare = layer.span("cli.prepare").expect("cli.prepare span must exist");
    assert!(
        prepare
            .field("universe")
            .is_some_and(|value| value.ends_with("diamond.json"))
    );
    assert_eq!(prepare.field("rule"), Some("Descendants"));
    assert_eq!(prepare.field("entities"), Some("diamond"));

    assert!(layer.span("core.build_poset").is_some());
    assert!(layer.events().iter().any(|event| {
        event.level == Level::INFO
            && event.message() == Some("command completed")
            && event.field("data_source") == Some("diamond")
    }));
    Ok(())
}

#[rstest]
fn entity_loading_records_the_format() -> TestResult {
    let dir = temp_dir();
    let universe = create_file(&dir, "diamond.json", DIAMOND)?;
    let episodes = create_file(&dir, "sessions.json", EPISODES)?;
    let (universe, episodes) = (arg(&universe), arg(&episodes));

    let (summary, layer) = RecordingLayer::capture(|| {
        run(&[
            "analyze",
            &universe,
            "--entities",
            &episodes,
            "--format",
            "episodes",
        ])
    });
    summary?;

    let load = layer
        .span("cli.load_entities")
        .expect("cli.load_entities span must exist");
    assert_eq!(load.field("format"), Some("episodes"));
    assert!(
        load.field("path")
            .is_some_and(|value| value.ends_with("sessions.json"))
    );
    assert!(layer.has_event(Level::INFO, "entities loaded"));
    Ok(())
}
