//! Post-game review of a recorded chess game with a UCI engine.
//!
//! The game is replayed ply by ply. The engine scores the position before
//! and after every move, and moves that lose too much evaluation are
//! classified as inaccuracies, mistakes or blunders.
//!
//! # Overview
//!
//! - [`GameRecord`] - A game parsed from PGN, with legal moves resolved
//! - [`EngineSession`] - A running UCI engine behind the [`Engine`] trait
//! - [`MoveEvaluator`] - Evaluates one ply at a time into [`MoveRecord`]s
//! - [`Severity`] - Classification of an evaluation drop
//! - [`PlaybackDriver`] - Runs a whole game and reports progress
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{review_file, AnalysisConfig, EngineSession};
//!
//! let config = AnalysisConfig::default();
//! let outcome = review_file(path, &config, &mut reporter, None, EngineSession::start)?;
//! for flag in outcome.flagged() {
//!     println!("{}", flag.message());
//! }
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod evaluation;
pub mod evaluator;
pub mod game;
pub mod quality;

pub use config::{AnalysisConfig, DeltaPerspective};
pub use driver::{
    review_file, side_name, DriverState, FlaggedMove, PlaybackDriver, Renderer, Reporter,
    ReviewError, ReviewEvent, RunOutcome, RunStatus,
};
pub use engine::{Engine, EngineError, EngineSession, SessionGuard};
pub use evaluation::{format_score, Evaluation, MATE_SCORE};
pub use evaluator::{score_delta, MoveEvaluator, MoveRecord};
pub use game::{GameError, GameMove, GameRecord, ReplayPosition};
pub use quality::{classify, PlayerStats, Severity, SeverityThresholds};
