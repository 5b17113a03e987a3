//! Whole-game reviews against a scripted engine.

mod common;

use std::cell::Cell;
use std::path::Path;
use std::time::{Duration, Instant};

use chess_analysis::{
    review_file, AnalysisConfig, DeltaPerspective, DriverState, EngineError, GameRecord,
    PlaybackDriver, ReviewError, ReviewEvent, RunStatus, Severity,
};
use common::{
    pgn_file, quick_config, RecordingRenderer, RecordingReporter, ScriptedEngine, FOUR_PLIES,
    RUY_LOPEZ,
};
use shakmaty::Color;

#[test]
fn test_blunder_is_flagged_in_reference_perspective() {
    let game = GameRecord::from_pgn_str(FOUR_PLIES).unwrap();
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let engine = ScriptedEngine::new(vec![Some(50), Some(-260), Some(-260), Some(0)]);

    let mut driver = PlaybackDriver::new(&config, &mut reporter);
    let outcome = driver.run(&game, |_| Ok(engine)).unwrap();
    assert_eq!(driver.state(), DriverState::Completed);

    assert!(outcome.is_complete());
    let deltas: Vec<Option<i32>> = outcome.records.iter().map(|r| r.delta).collect();
    assert_eq!(deltas, vec![None, Some(310), Some(0), Some(-260)]);
    let severities: Vec<Severity> = outcome.records.iter().map(|r| r.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::None, Severity::Blunder, Severity::None, Severity::None]
    );

    let flagged: Vec<_> = outcome.flagged().collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].ply_index, 2);
    assert_eq!(flagged[0].actor, Color::Black);
    assert_eq!(flagged[0].notation, "e5");
    assert_eq!(flagged[0].drop_cp, 310);
}

#[test]
fn test_events_arrive_in_order() {
    let game = GameRecord::from_pgn_str(FOUR_PLIES).unwrap();
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let engine = ScriptedEngine::new(vec![Some(50), Some(-260), Some(-260), Some(0)]);

    PlaybackDriver::new(&config, &mut reporter)
        .run(&game, |_| Ok(engine))
        .unwrap();

    let events = &reporter.events;
    assert!(matches!(
        &events[0],
        ReviewEvent::Started { engine, white, black, plies: 4 }
            if engine == "Scripted" && white == "Alice" && black == "Bob"
    ));
    assert!(matches!(&events[1], ReviewEvent::Ply(r) if r.ply_index == 1));
    assert!(matches!(&events[2], ReviewEvent::Ply(r) if r.ply_index == 2));
    assert!(matches!(&events[3], ReviewEvent::Flagged(f) if f.ply_index == 2));
    assert!(matches!(&events[4], ReviewEvent::Ply(r) if r.ply_index == 3));
    assert!(matches!(&events[5], ReviewEvent::Ply(r) if r.ply_index == 4));
    match &events[6] {
        ReviewEvent::Summary { white, black } => {
            assert_eq!(white.total_moves, 2);
            assert_eq!(black.total_moves, 2);
            assert_eq!(black.blunders, 1);
            assert_eq!(white.blunders, 0);
        }
        other => panic!("expected summary, got {:?}", other),
    }
    assert_eq!(events[7], ReviewEvent::Finished(RunStatus::Completed));
    assert_eq!(events.len(), 8);
}

#[test]
fn test_undefined_score_does_not_stop_the_run() {
    let game = GameRecord::from_pgn_str(FOUR_PLIES).unwrap();
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let engine = ScriptedEngine::new(vec![Some(10), None, Some(20), Some(-500)]);

    let outcome = PlaybackDriver::new(&config, &mut reporter)
        .run(&game, |_| Ok(engine))
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.records[1].post_move_score, None);
    assert_eq!(outcome.records[1].severity, Severity::None);
    assert_eq!(outcome.records[2].delta, None);
    assert_eq!(outcome.records[3].delta, Some(520));
    assert_eq!(outcome.records[3].severity, Severity::Blunder);
}

#[test]
fn test_engine_stopped_once_after_complete_run() {
    let game = GameRecord::from_pgn_str(FOUR_PLIES).unwrap();
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let engine = ScriptedEngine::new(vec![Some(0); 4]);
    let stops = engine.stop_counter();

    PlaybackDriver::new(&config, &mut reporter)
        .run(&game, |_| Ok(engine))
        .unwrap();

    assert_eq!(stops.get(), 1);
}

#[test]
fn test_crash_mid_game_aborts_with_partial_records() {
    let game = GameRecord::from_pgn_str(RUY_LOPEZ).unwrap();
    assert_eq!(game.len(), 10);
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let engine = ScriptedEngine::new(vec![Some(30); 10]).crash_on_ply(3);
    let stops = engine.stop_counter();

    let mut driver = PlaybackDriver::new(&config, &mut reporter);
    let outcome = driver.run(&game, |_| Ok(engine)).unwrap();
    assert_eq!(driver.state(), DriverState::Aborted);

    assert_eq!(outcome.records.len(), 2);
    assert!(!outcome.is_complete());
    assert_eq!(
        outcome.status,
        RunStatus::Aborted("Engine process terminated unexpectedly".to_string())
    );
    assert_eq!(stops.get(), 1);

    let plies = reporter
        .events
        .iter()
        .filter(|e| matches!(e, ReviewEvent::Ply(_)))
        .count();
    assert_eq!(plies, 2);
    assert!(matches!(
        reporter.events.last(),
        Some(ReviewEvent::Finished(RunStatus::Aborted(_)))
    ));
}

#[test]
fn test_missing_file_never_launches_engine() {
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let launched = Cell::new(false);

    let result = review_file(
        Path::new("/nonexistent/dir/game.pgn"),
        &config,
        &mut reporter,
        None,
        |_: &AnalysisConfig| {
            launched.set(true);
            Ok(ScriptedEngine::new(vec![]))
        },
    );

    assert!(matches!(result, Err(ReviewError::FileNotFound(_))));
    assert!(!launched.get());
    assert!(reporter.events.is_empty());
}

#[test]
fn test_game_without_moves_never_launches_engine() {
    let file = pgn_file("[Event \"Empty\"]\n\n*\n");
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let launched = Cell::new(false);

    let result = review_file(file.path(), &config, &mut reporter, None, |_: &AnalysisConfig| {
        launched.set(true);
        Ok(ScriptedEngine::new(vec![]))
    });

    assert!(matches!(result, Err(ReviewError::MalformedGame(_))));
    assert!(!launched.get());
}

#[test]
fn test_unavailable_engine_is_reported() {
    let file = pgn_file(FOUR_PLIES);
    let config = quick_config();
    let mut reporter = RecordingReporter::default();

    let result = review_file(file.path(), &config, &mut reporter, None, |config| {
        Err::<ScriptedEngine, _>(EngineError::Unavailable {
            path: config.engine_path.display().to_string(),
            reason: "No such file or directory".to_string(),
        })
    });

    match result {
        Err(ReviewError::EngineUnavailable(EngineError::Unavailable { path, .. })) => {
            assert_eq!(path, "stockfish");
        }
        other => panic!("expected unavailable engine, got {:?}", other),
    }
    assert!(reporter.events.is_empty());
}

#[test]
fn test_review_file_runs_the_game() {
    let file = pgn_file(FOUR_PLIES);
    let config = quick_config();
    let mut reporter = RecordingReporter::default();

    let outcome = review_file(file.path(), &config, &mut reporter, None, |_| {
        Ok(ScriptedEngine::new(vec![Some(50), Some(-260), Some(-260), Some(0)]))
    })
    .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.flagged().count(), 1);
}

#[test]
fn test_renderer_sees_every_ply_and_flag_highlight() {
    let file = pgn_file(FOUR_PLIES);
    let config = quick_config();
    let mut reporter = RecordingReporter::default();
    let mut renderer = RecordingRenderer::default();

    review_file(
        file.path(),
        &config,
        &mut reporter,
        Some(&mut renderer),
        |_| Ok(ScriptedEngine::new(vec![Some(50), Some(-260), Some(-260), Some(0)])),
    )
    .unwrap();

    let frames = &renderer.frames;
    assert_eq!(frames.len(), 4);
    // board after 1. e4 e5
    assert_eq!(frames[1].turn, Color::White);
    assert_eq!(frames[1].fullmoves, 2);
    assert_eq!(frames[1].highlight.as_deref(), Some("b8c6"));
    assert_eq!(
        frames[1].message.as_deref(),
        Some("Black blundered on move 1: e5 (drop: 310 cp, engine preferred b8c6)")
    );
    for i in [0, 2, 3] {
        assert_eq!(frames[i].highlight, None);
        assert_eq!(frames[i].message, None);
    }
}

#[test]
fn test_mover_perspective_catches_black_blunder() {
    let game = GameRecord::from_pgn_str("1. e4 e5 *").unwrap();

    let review = |perspective| {
        let config = AnalysisConfig {
            perspective,
            ..quick_config()
        };
        let mut reporter = RecordingReporter::default();
        let outcome = PlaybackDriver::new(&config, &mut reporter)
            .run(&game, |_| Ok(ScriptedEngine::new(vec![Some(20), Some(400)])))
            .unwrap();
        outcome
    };

    let reference = review(DeltaPerspective::Reference);
    assert_eq!(reference.records[1].delta, Some(-380));
    assert_eq!(reference.records[1].severity, Severity::None);

    let mover = review(DeltaPerspective::Mover);
    assert_eq!(mover.records[1].delta, Some(380));
    assert_eq!(mover.records[1].severity, Severity::Blunder);
}

#[test]
fn test_pacing_only_between_rendered_plies() {
    let game = GameRecord::from_pgn_str(FOUR_PLIES).unwrap();
    let config = AnalysisConfig {
        pacing_delay: Duration::from_millis(200),
        ..quick_config()
    };
    let mut reporter = RecordingReporter::default();

    let started = Instant::now();
    PlaybackDriver::new(&config, &mut reporter)
        .run(&game, |_| Ok(ScriptedEngine::new(vec![Some(0); 4])))
        .unwrap();
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "no pause without a renderer"
    );

    // three pauses for four plies, none after the last
    let mut renderer = RecordingRenderer::default();
    let started = Instant::now();
    PlaybackDriver::new(&config, &mut reporter)
        .with_renderer(&mut renderer)
        .run(&game, |_| Ok(ScriptedEngine::new(vec![Some(0); 4])))
        .unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(600), "paused {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(800), "paused {:?}", elapsed);
    assert_eq!(renderer.frames.len(), 4);
}
