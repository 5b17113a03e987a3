//! Review configuration.
//!
//! Built once by the caller (the CLI) and passed by reference into the
//! engine session and the playback driver.

use std::path::PathBuf;
use std::time::Duration;

use crate::quality::SeverityThresholds;

/// How the evaluation drop of a move is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaPerspective {
    /// `previous - current` in White's perspective for both sides.
    ///
    /// Reproduces the classic single-perspective report: a Black move that
    /// improves Black's position shows up as a positive drop.
    #[default]
    Reference,
    /// Drop measured from the side that moved (sign flipped for Black).
    Mover,
}

/// Configuration for a game review.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Path or command name of the UCI engine executable.
    pub engine_path: PathBuf,
    /// Search time for every position query (`go movetime`).
    pub time_limit: Duration,
    /// Extra time allowed for a `bestmove` reply beyond `time_limit`.
    pub reply_grace: Duration,
    /// Upper bound on the `uci`/`isready` handshake at startup.
    pub handshake_timeout: Duration,
    /// Severity band boundaries.
    pub thresholds: SeverityThresholds,
    /// Sleep between plies when a renderer is attached.
    pub pacing_delay: Duration,
    /// Which side's perspective move drops are measured from.
    pub perspective: DeltaPerspective,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("stockfish"),
            time_limit: Duration::from_millis(100),
            reply_grace: Duration::from_secs(2),
            handshake_timeout: Duration::from_secs(10),
            thresholds: SeverityThresholds::default(),
            pacing_delay: Duration::from_millis(1000),
            perspective: DeltaPerspective::Reference,
        }
    }
}
