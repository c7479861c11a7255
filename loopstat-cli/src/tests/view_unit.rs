//! Focused unit tests covering the single-view subcommands.

use super::helpers::{scratch_dir, write_recycling_extract};
use super::*;
use crate::view_command::{ViewConfig, trend_config_from_layers_for_test};
use camino::Utf8PathBuf;
use loopstat_core::{Aggregation, EntityMatcher, Period, Tier, TrendSpec, View, ViewSpec};
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;

fn trend_args(input: &str) -> TrendArgs {
    TrendArgs {
        input: Some(Utf8PathBuf::from(input)),
        ..TrendArgs::default()
    }
}

fn rendered(config: ViewConfig) -> View {
    let mut buffer = Vec::new();
    run_view_with(config, &mut buffer).expect("view should render");
    let stdout = String::from_utf8(buffer).expect("stdout utf-8");
    serde_json::from_str(&stdout).expect("output should be a JSON view")
}

#[rstest]
#[case::frames(ViewConfig::try_from(FramesArgs::default()), ENV_FRAMES_INPUT)]
#[case::trend(ViewConfig::try_from(TrendArgs::default()), ENV_TREND_INPUT)]
#[case::snapshot(ViewConfig::try_from(SnapshotArgs::default()), ENV_SNAPSHOT_INPUT)]
fn converting_without_input_errors(
    #[case] outcome: Result<ViewConfig, CliError>,
    #[case] env_var: &'static str,
) {
    match outcome.expect_err("missing input should error") {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn trend_config_applies_defaults() {
    let config = ViewConfig::try_from(trend_args("rates.csv")).expect("config should build");
    let ViewSpec::TieredTrend(TrendSpec {
        window,
        top_n,
        top_tier_size,
        spotlight,
        aggregation,
        backfill_top_tier,
    }) = config.spec
    else {
        panic!("expected trend spec, found {:?}", config.spec);
    };
    assert_eq!(window.get(), DEFAULT_WINDOW);
    assert_eq!(top_n.get(), DEFAULT_TOP_N);
    assert_eq!(top_tier_size, DEFAULT_TOP_TIER);
    assert_eq!(spotlight, None);
    assert_eq!(aggregation, Aggregation::Sum);
    assert!(!backfill_top_tier);
    assert!(config.filter.is_empty());
}

#[rstest]
fn frames_config_builds_the_filter() {
    let args = FramesArgs {
        input: Some(Utf8PathBuf::from("waste.csv")),
        exclude: vec!["Liechtenstein".to_owned()],
        exclude_containing: vec!["European Union".to_owned()],
        since: Some(2003),
        ..FramesArgs::default()
    };
    let config = ViewConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.filter.exclude,
        [
            EntityMatcher::Exact("Liechtenstein".to_owned()),
            EntityMatcher::Substring("European Union".to_owned()),
        ]
    );
    assert_eq!(config.filter.since, Some(Period::new(2003)));
}

#[rstest]
#[case::window(TrendArgs { window: Some(0), ..trend_args("rates.csv") }, ARG_WINDOW)]
#[case::top_n(TrendArgs { top_n: Some(0), ..trend_args("rates.csv") }, ARG_TOP_N)]
fn zero_counts_are_rejected(#[case] args: TrendArgs, #[case] expected: &'static str) {
    match ViewConfig::try_from(args).expect_err("zero count should error") {
        CliError::ZeroCount { field } => assert_eq!(field, expected),
        other => panic!("expected ZeroCount, found {other:?}"),
    }
}

#[rstest]
fn exact_and_substring_spotlights_conflict() {
    let args = TrendArgs {
        spotlight: Some("Germany".to_owned()),
        spotlight_containing: Some("Germany".to_owned()),
        ..trend_args("rates.csv")
    };
    match ViewConfig::try_from(args).expect_err("conflicting spotlights") {
        CliError::ConflictingArguments { first, second } => {
            assert_eq!(first, ARG_SPOTLIGHT);
            assert_eq!(second, ARG_SPOTLIGHT_CONTAINING);
        }
        other => panic!("expected ConflictingArguments, found {other:?}"),
    }
}

#[rstest]
fn blank_patterns_are_rejected() {
    let args = TrendArgs {
        spotlight_containing: Some("   ".to_owned()),
        ..trend_args("rates.csv")
    };
    match ViewConfig::try_from(args).expect_err("blank spotlight") {
        CliError::InvalidMatcher { field, .. } => assert_eq!(field, ARG_SPOTLIGHT_CONTAINING),
        other => panic!("expected InvalidMatcher, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_input() {
    let (_tmp, root) = scratch_dir();
    let config = ViewConfig::try_from(trend_args(root.join("absent.csv").as_str()))
        .expect("config should build");
    match config.validate_sources().expect_err("missing input") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_INPUT),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file() {
    let (_tmp, root) = scratch_dir();
    let config = ViewConfig::try_from(trend_args(root.as_str())).expect("config should build");
    match config.validate_sources().expect_err("directory input") {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(path, root);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn trend_output_tiers_the_summed_ranking() {
    let (_tmp, root) = scratch_dir();
    let input = root.join("rates.csv");
    write_recycling_extract(&input);
    let args = TrendArgs {
        spotlight: Some("Germany".to_owned()),
        ..trend_args(input.as_str())
    };

    let view = rendered(ViewConfig::try_from(args).expect("config should build"));
    let View::Trend {
        window,
        ranking,
        series,
    } = view
    else {
        panic!("expected trend view, found {view:?}");
    };
    assert_eq!(window.len(), 3);
    assert_eq!(ranking.tiers.top_tier(), ["France", "Italy"]);
    assert_eq!(ranking.tiers.tier_of("Germany"), Some(Tier::Spotlight));
    assert_eq!(ranking.tiers.background(), ["Spain"]);
    assert_eq!(series.len(), 12);
}

#[rstest]
fn backfilled_trend_refills_the_top_tier() {
    let (_tmp, root) = scratch_dir();
    let input = root.join("rates.csv");
    write_recycling_extract(&input);
    let args = TrendArgs {
        spotlight: Some("Germany".to_owned()),
        backfill_top_tier: true,
        ..trend_args(input.as_str())
    };

    let view = rendered(ViewConfig::try_from(args).expect("config should build"));
    let View::Trend { ranking, .. } = view else {
        panic!("expected trend view, found {view:?}");
    };
    assert_eq!(ranking.tiers.top_tier(), ["France", "Italy", "Spain"]);
    assert_eq!(ranking.tiers.tier_of("Germany"), Some(Tier::Spotlight));
    assert!(ranking.tiers.background().is_empty());
}

#[rstest]
fn frames_output_ranks_each_period() {
    let (_tmp, root) = scratch_dir();
    let input = root.join("rates.csv");
    write_recycling_extract(&input);
    let args = FramesArgs {
        input: Some(input),
        window: Some(2),
        top_n: Some(2),
        ..FramesArgs::default()
    };

    let view = rendered(ViewConfig::try_from(args).expect("config should build"));
    let View::Frames {
        window, rankings, ..
    } = view
    else {
        panic!("expected frames view, found {view:?}");
    };
    assert_eq!(window.periods(), [Period::new(2020), Period::new(2021)]);
    for set in rankings.iter() {
        assert_eq!(set.entities().collect::<Vec<_>>(), ["France", "Germany"]);
    }
}

#[rstest]
fn snapshot_output_honours_exclusions() {
    let (_tmp, root) = scratch_dir();
    let input = root.join("rates.csv");
    write_recycling_extract(&input);
    let args = SnapshotArgs {
        input: Some(input),
        exclude: vec!["Spain".to_owned()],
        ..SnapshotArgs::default()
    };

    let view = rendered(ViewConfig::try_from(args).expect("config should build"));
    let View::Snapshot {
        snapshot: Some(snapshot),
    } = view
    else {
        panic!("expected a populated snapshot, found {view:?}");
    };
    assert_eq!(snapshot.period, Period::new(2021));
    assert_eq!(snapshot.entries.len(), 3);
    assert!(snapshot.entries.iter().all(|entry| entry.entity != "Spain"));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "window": "many" }));

    let err = trend_config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "input": "from-file.csv",
            "window": 15,
            "top_tier": 2,
            "aggregation": "mean",
            "backfill_top_tier": true,
        }),
        None,
    );
    composer.push_environment(json!({
        "input": "from-env.csv",
        "window": 12,
    }));
    composer.push_cli(json!({ "window": 10 }));

    let config =
        trend_config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.input, Utf8PathBuf::from("from-env.csv"));
    let ViewSpec::TieredTrend(spec) = config.spec else {
        panic!("expected trend spec, found {:?}", config.spec);
    };
    assert_eq!(spec.window.get(), 10);
    assert_eq!(spec.top_tier_size, 2);
    assert_eq!(spec.aggregation, Aggregation::Mean);
    assert!(spec.backfill_top_tier);
}
