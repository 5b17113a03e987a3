//! Per-ply evaluation of a recorded game.

use shakmaty::Color;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, DeltaPerspective};
use crate::engine::{Engine, EngineError};
use crate::evaluation::Evaluation;
use crate::game::{GameMove, GameRecord, ReplayPosition};
use crate::quality::Severity;

/// The evaluation outcome of a single ply.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    /// 1-based index of the ply in the game.
    pub ply_index: usize,
    /// Full move number the ply belongs to.
    pub move_number: u32,
    /// Side that played the move.
    pub actor: Color,
    /// The move in SAN, as recorded.
    pub notation: String,
    /// The move in UCI notation.
    pub uci: String,
    /// Engine's suggested move in the position before this ply.
    pub pre_move_best: Option<String>,
    /// White-perspective score after the move.
    pub post_move_score: Option<i32>,
    /// Evaluation drop relative to the previous ply's post-move score.
    pub delta: Option<i32>,
    /// Classification of `delta`.
    pub severity: Severity,
}

impl MoveRecord {
    /// Size of the drop, for reporting.
    pub fn drop_cp(&self) -> Option<u32> {
        self.delta.map(i32::unsigned_abs)
    }
}

/// Compute the drop between two consecutive post-move scores.
///
/// Undefined unless both scores are defined.
pub fn score_delta(
    previous: Option<i32>,
    current: Option<i32>,
    actor: Color,
    perspective: DeltaPerspective,
) -> Option<i32> {
    let raw = previous?.checked_sub(current?)?;
    match (perspective, actor) {
        (DeltaPerspective::Mover, Color::Black) => Some(-raw),
        _ => Some(raw),
    }
}

/// Walks a game ply by ply, asking the engine about each position.
///
/// Each call to [`MoveEvaluator::evaluate_next`] issues two queries: one for
/// the position before the move (to learn the engine's suggestion) and one
/// for the position after it (to learn the resulting score).
pub struct MoveEvaluator<'g> {
    game: &'g GameRecord,
    config: &'g AnalysisConfig,
    position: ReplayPosition,
    next_ply: usize,
    previous_score: Option<i32>,
}

impl<'g> MoveEvaluator<'g> {
    pub fn new(game: &'g GameRecord, config: &'g AnalysisConfig) -> Self {
        Self {
            game,
            config,
            position: ReplayPosition::start_of(game),
            next_ply: 0,
            previous_score: None,
        }
    }

    /// Position reached after the last evaluated ply.
    pub fn position(&self) -> &ReplayPosition {
        &self.position
    }

    /// Evaluate the next ply of the game.
    ///
    /// Returns `Ok(None)` once every ply has been evaluated. Recoverable
    /// engine errors only leave this ply unclassified.
    ///
    /// # Errors
    ///
    /// Returns the engine error when it is fatal. The evaluator does not
    /// advance in that case.
    pub fn evaluate_next<E: Engine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Option<MoveRecord>, EngineError> {
        let game = self.game;
        let Some(game_move) = game.moves().get(self.next_ply) else {
            return Ok(None);
        };
        let ply_index = self.next_ply + 1;

        let before = self.query(engine, &self.position, ply_index)?;
        let after_position = self.position.after(game_move);
        let after = self.query(engine, &after_position, ply_index)?;

        let record = self.record(ply_index, game_move, before, after.score_cp);

        self.previous_score = after.score_cp;
        self.position = after_position;
        self.next_ply += 1;
        Ok(Some(record))
    }

    fn record(
        &self,
        ply_index: usize,
        game_move: &GameMove,
        before: Evaluation,
        post_move_score: Option<i32>,
    ) -> MoveRecord {
        let actor = self.position.turn();
        // a ply whose pre-move query went unanswered is left unclassified
        let delta = match before.score_cp {
            Some(_) => score_delta(
                self.previous_score,
                post_move_score,
                actor,
                self.config.perspective,
            ),
            None => None,
        };

        MoveRecord {
            ply_index,
            move_number: self.position.fullmoves(),
            actor,
            notation: game_move.san.clone(),
            uci: game_move.uci.clone(),
            pre_move_best: before.principal_move,
            post_move_score,
            delta,
            severity: self.config.thresholds.classify(delta),
        }
    }

    fn query<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        position: &ReplayPosition,
        ply_index: usize,
    ) -> Result<Evaluation, EngineError> {
        match engine.analyze(position, self.config.time_limit) {
            Ok(eval) => {
                if eval.score_cp.is_none() {
                    debug!(ply = ply_index, "no score, ply stays unclassified");
                }
                Ok(eval)
            }
            Err(e) if !e.is_fatal() => {
                warn!(ply = ply_index, "engine query failed, ply stays unclassified: {}", e);
                Ok(Evaluation::unknown())
            }
            Err(e) => Err(e),
        }
    }
}
