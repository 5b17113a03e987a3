//! Playback of a whole game through the analysis pipeline.
//!
//! The [`PlaybackDriver`] owns the engine session for one run, feeds every
//! ply to the [`MoveEvaluator`], and forwards what it learns to a
//! [`Reporter`] and, optionally, a [`Renderer`].

use std::fmt;
use std::path::{Path, PathBuf};

use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::engine::{Engine, EngineError, SessionGuard};
use crate::evaluator::{MoveEvaluator, MoveRecord};
use crate::game::{GameError, GameRecord};
use crate::quality::{PlayerStats, Severity};

/// Errors that stop a review before any move is analyzed.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// The notation file does not exist.
    #[error("PGN file '{}' not found", .0.display())]
    FileNotFound(PathBuf),
    /// The notation file could not be read.
    #[error("Failed to read PGN file: {0}")]
    Unreadable(std::io::Error),
    /// The notation holds no playable game.
    #[error("Malformed game: {0}")]
    MalformedGame(String),
    /// The engine could not be started.
    #[error("{0}")]
    EngineUnavailable(EngineError),
}

impl From<GameError> for ReviewError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::FileNotFound(path) => ReviewError::FileNotFound(path),
            GameError::Io(e) => ReviewError::Unreadable(e),
            GameError::MalformedGame(msg) => ReviewError::MalformedGame(msg),
        }
    }
}

/// Draws the replay. Called synchronously after every ply.
pub trait Renderer {
    /// Show `position`, marking `highlight` (the engine's suggestion for a
    /// flagged move) and an optional status line.
    fn render(&mut self, position: &Chess, highlight: Option<&UciMove>, message: Option<&str>);
}

/// Receives the progress of a review.
pub trait Reporter {
    fn report(&mut self, event: &ReviewEvent);
}

/// A ply whose severity is above [`Severity::None`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedMove {
    pub ply_index: usize,
    pub move_number: u32,
    pub actor: Color,
    pub notation: String,
    pub severity: Severity,
    /// Magnitude of the evaluation drop in centipawns.
    pub drop_cp: u32,
    /// What the engine preferred in the position before the move.
    pub pre_move_best: Option<String>,
}

impl FlaggedMove {
    /// `None` unless the record is flagged.
    pub fn from_record(record: &MoveRecord) -> Option<Self> {
        if !record.severity.is_flagged() {
            return None;
        }
        Some(Self {
            ply_index: record.ply_index,
            move_number: record.move_number,
            actor: record.actor,
            notation: record.notation.clone(),
            severity: record.severity,
            drop_cp: record.drop_cp().unwrap_or(0),
            pre_move_best: record.pre_move_best.clone(),
        })
    }

    /// One-line description, e.g. "Black blundered on move 3: Nf6 (drop: 310 cp)".
    pub fn message(&self) -> String {
        let mut msg = format!(
            "{} {} on move {}: {} (drop: {} cp",
            side_name(self.actor),
            self.severity.label(),
            self.move_number,
            self.notation,
            self.drop_cp
        );
        if let Some(best) = &self.pre_move_best {
            msg.push_str(&format!(", engine preferred {}", best));
        }
        msg.push(')');
        msg
    }
}

/// "White" or "Black".
pub fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every ply was analyzed.
    Completed,
    /// The engine failed mid-run; the reason is human readable.
    Aborted(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "complete"),
            RunStatus::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Progress notifications sent to the [`Reporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEvent {
    /// The engine is up and the replay begins.
    Started {
        engine: String,
        white: String,
        black: String,
        plies: usize,
    },
    /// A ply has been evaluated.
    Ply(MoveRecord),
    /// The ply just reported was flagged.
    Flagged(FlaggedMove),
    /// Per-side summary over the plies that were analyzed.
    Summary { white: PlayerStats, black: PlayerStats },
    /// The session is stopped; nothing follows.
    Finished(RunStatus),
}

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    SessionStarting,
    /// Evaluating the given 1-based ply.
    Analyzing { ply: usize },
    SessionStopping,
    Completed,
    Aborted,
}

/// Result of a run that got as far as starting the engine.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Records for every ply analyzed, in order. On abort this is a prefix of
    /// the game.
    pub records: Vec<MoveRecord>,
    pub status: RunStatus,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn stats(&self, side: Color) -> PlayerStats {
        PlayerStats::from_records(&self.records, side)
    }

    /// Flagged plies in game order.
    pub fn flagged(&self) -> impl Iterator<Item = FlaggedMove> + '_ {
        self.records.iter().filter_map(FlaggedMove::from_record)
    }
}

/// Sequences one game through the engine.
pub struct PlaybackDriver<'a> {
    config: &'a AnalysisConfig,
    reporter: &'a mut dyn Reporter,
    renderer: Option<&'a mut dyn Renderer>,
    state: DriverState,
}

impl<'a> PlaybackDriver<'a> {
    pub fn new(config: &'a AnalysisConfig, reporter: &'a mut dyn Reporter) -> Self {
        Self {
            config,
            reporter,
            renderer: None,
            state: DriverState::Idle,
        }
    }

    /// Attach a renderer; enables pacing between plies.
    pub fn with_renderer(mut self, renderer: &'a mut dyn Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Analyze `game` with an engine obtained from `launch`.
    ///
    /// The engine is stopped exactly once before this returns, whether the
    /// run completes or aborts.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::EngineUnavailable`] if `launch` fails; the game
    /// is not played in that case. Engine failures after startup are not
    /// errors: they end the run with [`RunStatus::Aborted`].
    pub fn run<E, F>(&mut self, game: &GameRecord, launch: F) -> Result<RunOutcome, ReviewError>
    where
        E: Engine,
        F: FnOnce(&AnalysisConfig) -> Result<E, EngineError>,
    {
        self.transition(DriverState::SessionStarting);
        let engine = match launch(self.config) {
            Ok(engine) => engine,
            Err(e) => {
                self.transition(DriverState::Aborted);
                return Err(ReviewError::EngineUnavailable(e));
            }
        };
        let mut session = SessionGuard::new(engine);

        self.reporter.report(&ReviewEvent::Started {
            engine: session.name().to_string(),
            white: game.white().to_string(),
            black: game.black().to_string(),
            plies: game.len(),
        });

        let mut evaluator = MoveEvaluator::new(game, self.config);
        let mut records: Vec<MoveRecord> = Vec::with_capacity(game.len());
        let mut failure = None;

        while records.len() < game.len() {
            self.transition(DriverState::Analyzing {
                ply: records.len() + 1,
            });
            match evaluator.evaluate_next(&mut *session) {
                Ok(Some(record)) => {
                    self.publish(&record, evaluator.position().board());
                    if self.renderer.is_some()
                        && record.ply_index < game.len()
                        && !self.config.pacing_delay.is_zero()
                    {
                        std::thread::sleep(self.config.pacing_delay);
                    }
                    records.push(record);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(ply = records.len() + 1, "aborting review: {}", e);
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        self.transition(DriverState::SessionStopping);
        if let Err(e) = session.stop() {
            warn!("engine did not stop cleanly: {}", e);
        }

        let status = match failure {
            None => {
                self.transition(DriverState::Completed);
                RunStatus::Completed
            }
            Some(reason) => {
                self.transition(DriverState::Aborted);
                RunStatus::Aborted(reason)
            }
        };
        info!(plies = records.len(), status = %status, "review finished");

        let outcome = RunOutcome { records, status };
        self.reporter.report(&ReviewEvent::Summary {
            white: outcome.stats(Color::White),
            black: outcome.stats(Color::Black),
        });
        self.reporter
            .report(&ReviewEvent::Finished(outcome.status.clone()));
        Ok(outcome)
    }

    fn publish(&mut self, record: &MoveRecord, position: &Chess) {
        self.reporter.report(&ReviewEvent::Ply(record.clone()));

        let flagged = FlaggedMove::from_record(record);
        if let Some(flag) = &flagged {
            self.reporter.report(&ReviewEvent::Flagged(flag.clone()));
        }

        if let Some(renderer) = self.renderer.as_deref_mut() {
            let highlight = flagged
                .as_ref()
                .and_then(|f| f.pre_move_best.as_deref())
                .and_then(|best| best.parse::<UciMove>().ok());
            let message = flagged.as_ref().map(FlaggedMove::message);
            renderer.render(position, highlight.as_ref(), message.as_deref());
        }
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "driver state");
        self.state = next;
    }
}

/// Load the game at `path` and review it.
///
/// Nothing is launched when the file is missing or holds no playable game.
pub fn review_file<'a, E, F>(
    path: &Path,
    config: &'a AnalysisConfig,
    reporter: &'a mut dyn Reporter,
    renderer: Option<&'a mut dyn Renderer>,
    launch: F,
) -> Result<RunOutcome, ReviewError>
where
    E: Engine,
    F: FnOnce(&AnalysisConfig) -> Result<E, EngineError>,
{
    let game = GameRecord::from_pgn_file(path)?;
    debug!(path = %path.display(), plies = game.len(), "loaded game");

    let mut driver = PlaybackDriver::new(config, reporter);
    if let Some(renderer) = renderer {
        driver = driver.with_renderer(renderer);
    }
    driver.run(&game, launch)
}
