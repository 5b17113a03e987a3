//! Chess position evaluation types.

use shakmaty::Color;
use uci::Score;

/// Magnitude substituted for any forced-mate score.
pub const MATE_SCORE: i32 = 10_000;

/// An engine's verdict on one position.
///
/// `score_cp` is always from White's point of view (positive = White is
/// better). It is `None` when the engine produced no usable score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Centipawn score from White's perspective, mates clamped to [`MATE_SCORE`].
    pub score_cp: Option<i32>,
    /// First move of the engine's principal variation, in UCI notation.
    pub principal_move: Option<String>,
}

impl Evaluation {
    /// An evaluation with no score and no suggestion.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Build an evaluation from a raw engine score.
    ///
    /// UCI engines score from the side to move's perspective; `turn` is the side
    /// to move in the analyzed position and is used to normalize to White.
    pub fn from_engine_score(
        score: Option<Score>,
        turn: Color,
        principal_move: Option<String>,
    ) -> Self {
        let relative = score.map(|s| match s {
            Score::Cp(cp) => cp.clamp(-MATE_SCORE, MATE_SCORE),
            Score::Mate(n) if n > 0 => MATE_SCORE,
            // mate 0 means the side to move is already checkmated
            Score::Mate(_) => -MATE_SCORE,
        });

        Self {
            score_cp: relative.map(|cp| match turn {
                Color::White => cp,
                Color::Black => -cp,
            }),
            principal_move,
        }
    }

    /// Whether the score is a clamped mate score.
    pub fn is_mate(&self) -> bool {
        self.score_cp.is_some_and(|cp| cp.abs() == MATE_SCORE)
    }
}

/// Format a White-perspective centipawn score as pawns, e.g. `+0.35`, `#+`.
pub fn format_score(score_cp: Option<i32>) -> String {
    match score_cp {
        None => "n/a".to_string(),
        Some(cp) if cp >= MATE_SCORE => "#+".to_string(),
        Some(cp) if cp <= -MATE_SCORE => "#-".to_string(),
        Some(cp) => format!("{:+.2}", cp as f64 / 100.0),
    }
}
