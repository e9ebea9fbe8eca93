use mpf_core::{
    error_codes, exit_code, MultiPathConfig, MultiPathError, MultiPathFinder, NullWriter,
    PathId, PathSeed, RawImportanceWeights, CsvWriter, LP_APPROX_NAME, LP_NAME,
};
use mpf_test_utils::{
    unit_inits, LogLevel, PathPlan, RecordingLogger, RecordingWriter, ScriptedRunner, StubModel,
    WriterRecord,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PARAMS: usize = 3;

fn config(paths: u32, multi_draws: usize) -> MultiPathConfig {
    MultiPathConfig::new()
        .with_seed(20_240_611)
        .with_num_paths(paths)
        .with_num_multi_draws(multi_draws)
}

fn expected_header() -> Vec<String> {
    vec![
        "theta.1".to_string(),
        "theta.2".to_string(),
        "theta.3".to_string(),
        LP_APPROX_NAME.to_string(),
        LP_NAME.to_string(),
    ]
}

#[test]
fn test_full_run_writes_header_rows_and_timing() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 50);
    let logger = Arc::new(RecordingLogger::new());
    let finder = MultiPathFinder::new(config(4, 120)).with_logger(logger.clone());

    let mut params = RecordingWriter::new();
    let mut diagnostics = RecordingWriter::new();
    let summary = finder
        .run(&runner, &model, &unit_inits(4), &mut params, &mut diagnostics)
        .unwrap();

    assert_eq!(summary.successful_paths.len(), 4);
    assert!(summary.failed_paths.is_empty());
    assert_eq!(summary.pooled_draws, 200);
    assert_eq!(summary.drawn_indices.len(), 120);
    assert!(summary.drawn_indices.iter().all(|&i| i < 200));
    assert_eq!(summary.eval_count, 40);
    assert_eq!(summary.error_code(), error_codes::OK);

    assert_eq!(params.records[0], WriterRecord::Header(expected_header()));
    assert_eq!(diagnostics.records, vec![WriterRecord::Header(expected_header())]);

    let rows = params.rows();
    assert_eq!(rows.len(), 120);
    assert!(rows.iter().all(|r| r.len() == PARAMS + 2));

    // Header, rows, break, three timing lines, break
    let tail = &params.records[121..];
    assert_eq!(tail.len(), 5);
    assert_eq!(tail[0], WriterRecord::Break);
    assert_eq!(tail[4], WriterRecord::Break);
    let texts = params.texts();
    assert!(texts[0].starts_with("Elapsed Time: "));
    assert!(texts[0].ends_with(" seconds (Paths)"));
    assert!(texts[1].starts_with("               "));
    assert!(texts[1].ends_with(" seconds (PSIS)"));
    assert!(texts[2].ends_with(" seconds (Total)"));

    assert!(logger.contains("Total log probability function evaluations: 40"));
}

#[test]
fn test_rows_are_pooled_columns() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 10);
    let finder = MultiPathFinder::new(config(2, 30));

    let mut params = RecordingWriter::new();
    let summary = finder
        .run(&runner, &model, &unit_inits(2), &mut params, &mut NullWriter)
        .unwrap();

    // Every column any successful path produced, without assuming block order
    let pooled: Vec<Vec<f64>> = runner
        .seen()
        .iter()
        .flat_map(|(_, seed)| {
            mpf_test_utils::random_samples(*seed, PARAMS, 10)
                .columns()
                .into_iter()
                .map(|c| c.to_vec())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(pooled.len(), summary.pooled_draws);

    let rows = params.rows();
    assert_eq!(rows.len(), summary.drawn_indices.len());
    for row in &rows {
        assert!(pooled.contains(*row), "row {row:?} is not a pooled column");
    }

    // The same pooled index always yields the same row
    for (a, ia) in rows.iter().zip(&summary.drawn_indices) {
        for (b, ib) in rows.iter().zip(&summary.drawn_indices) {
            if ia == ib {
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn test_paths_receive_consecutive_streams() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 5);
    let finder = MultiPathFinder::new(config(3, 10).with_path_offset(7));

    finder
        .run(&runner, &model, &unit_inits(3), &mut NullWriter, &mut NullWriter)
        .unwrap();

    let seen = runner.seen();
    assert_eq!(
        seen,
        vec![
            (PathId(0), PathSeed { seed: 20_240_611, stream: 7 }),
            (PathId(1), PathSeed { seed: 20_240_611, stream: 8 }),
            (PathId(2), PathSeed { seed: 20_240_611, stream: 9 }),
        ]
    );
}

#[test]
fn test_output_is_deterministic() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 40);

    let run = |threads: usize| {
        let finder = MultiPathFinder::new(config(6, 80).with_threads(threads));
        let mut params = RecordingWriter::new();
        let summary = finder
            .run(&runner, &model, &unit_inits(6), &mut params, &mut NullWriter)
            .unwrap();
        let rows: Vec<Vec<f64>> = params.rows().into_iter().cloned().collect();
        (summary.drawn_indices, rows)
    };

    let first = run(1);
    assert_eq!(first, run(1));
    assert_eq!(first, run(4));
}

#[test]
fn test_different_seed_changes_draws() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 40);

    let rows = |seed: u64| {
        let finder = MultiPathFinder::new(config(2, 50).with_seed(seed));
        let mut params = RecordingWriter::new();
        finder
            .run(&runner, &model, &unit_inits(2), &mut params, &mut NullWriter)
            .unwrap();
        params.rows().into_iter().cloned().collect::<Vec<_>>()
    };

    assert_ne!(rows(1), rows(2));
}

#[test]
fn test_failed_paths_are_logged_and_skipped() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 20)
        .with_plan(1, PathPlan::Fail { evals: 7 })
        .with_plan(3, PathPlan::Panic);
    let logger = Arc::new(RecordingLogger::new());
    let finder = MultiPathFinder::new(config(4, 25)).with_logger(logger.clone());

    let summary = finder
        .run(&runner, &model, &unit_inits(4), &mut NullWriter, &mut NullWriter)
        .unwrap();

    assert_eq!(summary.successful_paths, vec![PathId(0), PathId(2)]);
    assert_eq!(summary.failed_paths, vec![PathId(1), PathId(3)]);
    assert_eq!(summary.pooled_draws, 40);
    // Two successes at 10 evals each plus the partial count of path 1
    assert_eq!(summary.eval_count, 27);

    let info = logger.messages(LogLevel::Info);
    assert!(info.contains(&"Path 1 failed.".to_string()));
    assert!(info.contains(&"Path 3 failed.".to_string()));
    assert!(!info.iter().any(|m| m == "Path 0 failed." || m == "Path 2 failed."));
    assert!(logger.contains("Total log probability function evaluations: 27"));
}

#[test]
fn test_single_surviving_path_supplies_every_draw() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::failing(PARAMS).with_plan(2, PathPlan::Succeed { draws: 15, evals: 3 });
    let finder = MultiPathFinder::new(config(3, 60));

    let summary = finder
        .run(&runner, &model, &unit_inits(3), &mut NullWriter, &mut NullWriter)
        .unwrap();

    assert_eq!(summary.successful_paths, vec![PathId(2)]);
    assert_eq!(summary.pooled_draws, 15);
    assert_eq!(summary.drawn_indices.len(), 60);
    assert!(summary.drawn_indices.iter().all(|&i| i < 15));
}

#[test]
fn test_all_paths_failing_keeps_headers() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::failing(PARAMS);
    let logger = Arc::new(RecordingLogger::new());
    let finder = MultiPathFinder::new(config(3, 100)).with_logger(logger.clone());

    let mut params = RecordingWriter::new();
    let mut diagnostics = RecordingWriter::new();
    let result = finder.run(&runner, &model, &unit_inits(3), &mut params, &mut diagnostics);

    assert!(matches!(result, Err(MultiPathError::NoSuccessfulPaths)));
    assert_eq!(exit_code(&result), error_codes::SOFTWARE);
    assert_eq!(params.records, vec![WriterRecord::Header(expected_header())]);
    assert_eq!(diagnostics.records, vec![WriterRecord::Header(expected_header())]);

    assert!(logger.contains("No paths ran successfully"));
    assert!(!logger.contains("Total log probability function evaluations"));
    for id in 0..3 {
        assert!(logger.contains(&format!("Path {id} failed.")));
    }
}

#[test]
fn test_zero_multi_draws_writes_no_rows() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 10);
    let finder = MultiPathFinder::new(config(2, 0));

    let mut params = RecordingWriter::new();
    let summary = finder
        .run(&runner, &model, &unit_inits(2), &mut params, &mut NullWriter)
        .unwrap();

    assert!(summary.drawn_indices.is_empty());
    assert!(params.rows().is_empty());
    assert_eq!(params.records[1], WriterRecord::Break);
    assert_eq!(params.records.len(), 6);
}

#[test]
fn test_zero_refresh_suppresses_eval_summary() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 10);
    let logger = Arc::new(RecordingLogger::new());
    let finder = MultiPathFinder::new(config(2, 5).with_refresh(0)).with_logger(logger.clone());

    finder
        .run(&runner, &model, &unit_inits(2), &mut NullWriter, &mut NullWriter)
        .unwrap();

    assert!(!logger.contains("Total log probability function evaluations"));
}

#[test]
fn test_negligible_path_is_never_drawn() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 0)
        .with_plan(0, PathPlan::Ratios { ratios: vec![0.0; 30], evals: 1 })
        .with_plan(1, PathPlan::Ratios { ratios: vec![-800.0; 30], evals: 1 });
    let finder = MultiPathFinder::new(config(2, 500)).with_correction(RawImportanceWeights);

    let summary = finder
        .run(&runner, &model, &unit_inits(2), &mut NullWriter, &mut NullWriter)
        .unwrap();

    assert_eq!(summary.pooled_draws, 60);
    assert!(summary.drawn_indices.iter().all(|&i| i < 30));
}

#[test]
fn test_csv_output_layout() {
    let model = StubModel::with_params(PARAMS);
    let runner = ScriptedRunner::succeeding(PARAMS, 10);
    let finder = MultiPathFinder::new(config(2, 4));

    let mut params = CsvWriter::new(Vec::new());
    finder
        .run(&runner, &model, &unit_inits(2), &mut params, &mut NullWriter)
        .unwrap();
    let text = String::from_utf8(params.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "theta.1,theta.2,theta.3,lp_approx__,lp__");
    assert_eq!(lines[1..5].iter().filter(|l| l.split(',').count() == 5).count(), 4);
    assert_eq!(lines[5], "#");
    assert!(lines[6].starts_with("# Elapsed Time: "));
    assert_eq!(lines[9], "#");
    assert_eq!(lines.len(), 10);
}
