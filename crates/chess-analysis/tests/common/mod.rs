//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use chess_analysis::{
    AnalysisConfig, Engine, EngineError, Evaluation, Renderer, ReplayPosition, Reporter,
    ReviewEvent,
};
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position};

/// Engine double that replays a fixed list of post-move scores.
///
/// Every ply costs two queries: the even-numbered call is the pre-move query
/// and answers with `best_move`, the odd-numbered call answers with the
/// scripted post-move score for that ply.
pub struct ScriptedEngine {
    post_scores: Vec<Option<i32>>,
    best_move: String,
    crash_on_ply: Option<usize>,
    calls: usize,
    stops: Rc<Cell<u32>>,
}

impl ScriptedEngine {
    pub fn new(post_scores: Vec<Option<i32>>) -> Self {
        Self {
            post_scores,
            best_move: "b8c6".to_string(),
            crash_on_ply: None,
            calls: 0,
            stops: Rc::new(Cell::new(0)),
        }
    }

    /// Fail with [`EngineError::Crash`] on the first query of `ply` (1-based).
    pub fn crash_on_ply(mut self, ply: usize) -> Self {
        self.crash_on_ply = Some(ply);
        self
    }

    /// Counter incremented by every `stop()` call.
    pub fn stop_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.stops)
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn analyze(
        &mut self,
        _position: &ReplayPosition,
        _time_limit: Duration,
    ) -> Result<Evaluation, EngineError> {
        let ply = self.calls / 2 + 1;
        let pre_move = self.calls % 2 == 0;
        self.calls += 1;

        if self.crash_on_ply == Some(ply) {
            return Err(EngineError::Crash);
        }

        if pre_move {
            let previous = match ply {
                1 => Some(0),
                n => self.post_scores.get(n - 2).copied().flatten(),
            };
            Ok(Evaluation {
                score_cp: previous,
                principal_move: Some(self.best_move.clone()),
            })
        } else {
            Ok(Evaluation {
                score_cp: self.post_scores.get(ply - 1).copied().flatten(),
                principal_move: None,
            })
        }
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.stops.set(self.stops.get() + 1);
        Ok(())
    }
}

/// Collects every event it is given.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<ReviewEvent>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &ReviewEvent) {
        self.events.push(event.clone());
    }
}

/// What a renderer was asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub turn: Color,
    pub fullmoves: u32,
    pub highlight: Option<String>,
    pub message: Option<String>,
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, position: &Chess, highlight: Option<&UciMove>, message: Option<&str>) {
        self.frames.push(Frame {
            turn: position.turn(),
            fullmoves: position.fullmoves().get(),
            highlight: highlight.map(|m| m.to_string()),
            message: message.map(str::to_string),
        });
    }
}

/// Configuration that never sleeps.
pub fn quick_config() -> AnalysisConfig {
    AnalysisConfig {
        time_limit: Duration::from_millis(10),
        pacing_delay: Duration::ZERO,
        ..AnalysisConfig::default()
    }
}

/// Write `pgn` to a temporary file.
pub fn pgn_file(pgn: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(pgn.as_bytes()).expect("write pgn");
    file.flush().expect("flush pgn");
    file
}

pub const FOUR_PLIES: &str = "[White \"Alice\"]\n[Black \"Bob\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n";

pub const RUY_LOPEZ: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 *";
