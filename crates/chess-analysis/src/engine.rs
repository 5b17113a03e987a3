//! UCI engine session for position analysis.
//!
//! [`EngineSession`] owns one engine process for the duration of a review.
//! The process's stdout is drained by a reader thread so that every reply
//! can be awaited with a deadline; commands are still issued strictly one
//! at a time.

use std::io::{BufRead, BufReader, Write};
use std::ops::{Deref, DerefMut};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{EngineMessage, GuiCommand, UciError};

use crate::config::AnalysisConfig;
use crate::evaluation::Evaluation;
use crate::game::ReplayPosition;

/// How long `stop` waits for the process to exit after `quit` before killing it.
pub const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Stand-in deadline distance for limits too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Errors that can occur when working with an analysis engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be launched or did not complete the UCI handshake.
    #[error("Engine unavailable at '{path}': {reason}")]
    Unavailable { path: String, reason: String },
    /// The engine did not answer within the allowed time.
    #[error("Engine did not reply within {0:?}")]
    Timeout(Duration),
    /// The engine process went away mid-session.
    #[error("Engine process terminated unexpectedly")]
    Crash,
    /// Engine returned an invalid or unexpected response.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
    /// Talking to the engine failed for another I/O reason.
    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the session can no longer be used after this error.
    ///
    /// Only a malformed reply is recoverable: the engine is still in sync and
    /// the next query can proceed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::InvalidResponse(_))
    }
}

impl From<UciError> for EngineError {
    fn from(err: UciError) -> Self {
        match err {
            UciError::ParseError(msg) => EngineError::InvalidResponse(msg),
            UciError::IoError(e) => EngineError::Io(e),
        }
    }
}

/// An evaluation engine as seen by the review pipeline.
pub trait Engine {
    /// The engine's name as reported at startup.
    fn name(&self) -> &str;

    /// Evaluate `position`, searching for about `time_limit`.
    fn analyze(
        &mut self,
        position: &ReplayPosition,
        time_limit: Duration,
    ) -> Result<Evaluation, EngineError>;

    /// Terminate the engine.
    fn stop(&mut self) -> Result<(), EngineError>;
}

/// A running UCI engine process.
#[derive(Debug)]
pub struct EngineSession {
    /// The engine process handle.
    process: Child,
    /// Writer for sending commands to the engine.
    stdin: ChildStdin,
    /// Lines read from the engine's stdout by the reader thread.
    lines: Receiver<String>,
    /// The engine's name (reported via UCI id).
    name: String,
    /// Extra time granted to a search reply on top of its time limit.
    reply_grace: Duration,
    stopped: bool,
}

impl EngineSession {
    /// Launch the engine and prepare it for a new game.
    ///
    /// Spawns the process, performs the `uci`/`isready` handshake and sends
    /// `ucinewgame`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] if the executable cannot be
    /// spawned or does not complete the handshake within
    /// `config.handshake_timeout`. The process is killed in that case.
    pub fn start(config: &AnalysisConfig) -> Result<Self, EngineError> {
        let path = config.engine_path.display().to_string();
        let unavailable = |reason: String| EngineError::Unavailable {
            path: path.clone(),
            reason,
        };

        let mut process = Command::new(&config.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(e.to_string()))?;

        let (stdin, stdout) = match (process.stdin.take(), process.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = process.kill();
                let _ = process.wait();
                return Err(unavailable("engine pipes unavailable".to_string()));
            }
        };

        let (tx, lines) = mpsc::channel();
        std::thread::Builder::new()
            .name("engine-stdout".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| unavailable(e.to_string()))?;

        let mut session = Self {
            process,
            stdin,
            lines,
            name: String::new(),
            reply_grace: config.reply_grace,
            stopped: false,
        };

        // Dropping the session on failure kills the process.
        session
            .handshake(config.handshake_timeout)
            .and_then(|_| session.new_game(config.handshake_timeout))
            .map_err(|e| unavailable(e.to_string()))?;

        info!(engine = %session.name, path = %path, "engine session started");
        Ok(session)
    }

    /// Run `uci`/`uciok` and `isready`/`readyok`.
    fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = deadline_after(timeout);

        self.send(&GuiCommand::Uci)?;
        let mut name = String::new();
        loop {
            match self.read_message(deadline, timeout)? {
                EngineMessage::Id {
                    name: Some(n), ..
                } => name = n,
                EngineMessage::UciOk => break,
                _ => {}
            }
        }

        self.name = if name.is_empty() {
            "Unknown Engine".to_string()
        } else {
            name
        };

        self.wait_ready(deadline, timeout)
    }

    /// Clear the engine's state for a fresh game.
    fn new_game(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send(&GuiCommand::UciNewGame)?;
        self.wait_ready(deadline_after(timeout), timeout)
    }

    fn wait_ready(&mut self, deadline: Instant, timeout: Duration) -> Result<(), EngineError> {
        self.send(&GuiCommand::IsReady)?;
        loop {
            if let EngineMessage::ReadyOk = self.read_message(deadline, timeout)? {
                return Ok(());
            }
        }
    }

    /// Send a command to the engine.
    fn send(&mut self, command: &GuiCommand) -> Result<(), EngineError> {
        debug!(">> {}", command);
        let result = writeln!(self.stdin, "{}", command).and_then(|_| self.stdin.flush());
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(EngineError::Crash),
            Err(e) => Err(EngineError::Io(e)),
        }
    }

    /// Wait for the next message from the engine until `deadline`.
    ///
    /// `limit` is only used to describe a timeout.
    fn read_message(
        &mut self,
        deadline: Instant,
        limit: Duration,
    ) -> Result<EngineMessage, EngineError> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Timeout(limit));
            }
            let line = match self.lines.recv_timeout(remaining) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => return Err(EngineError::Timeout(limit)),
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::Crash),
            };
            debug!("<< {}", line);
            if let Some(msg) = EngineMessage::parse(&line)? {
                return Ok(msg);
            }
        }
    }
}

/// The instant `limit` from now, saturating at a far future point.
fn deadline_after(limit: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(limit)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl Engine for EngineSession {
    fn name(&self) -> &str {
        &self.name
    }

    /// Search `position` for `time_limit` and report the last exact score.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Timeout`] if `bestmove` does not arrive within
    ///   `time_limit` plus the configured grace
    /// - [`EngineError::Crash`] if the process closes its pipes
    /// - [`EngineError::InvalidResponse`] on a `bestmove` line without a move
    fn analyze(
        &mut self,
        position: &ReplayPosition,
        time_limit: Duration,
    ) -> Result<Evaluation, EngineError> {
        self.send(&position.to_command())?;
        let movetime = u64::try_from(time_limit.as_millis()).unwrap_or(u64::MAX).max(1);
        self.send(&GuiCommand::Go { movetime })?;

        let limit = time_limit.saturating_add(self.reply_grace);
        let deadline = deadline_after(limit);
        let mut score = None;
        let mut pv_head = None;

        loop {
            match self.read_message(deadline, limit)? {
                EngineMessage::Info(info) if info.is_primary() => {
                    if let Some(exact) = info.exact_score() {
                        score = Some(exact);
                        if let Some(first) = info.pv.first() {
                            pv_head = Some(first.clone());
                        }
                    }
                }
                EngineMessage::BestMove { mv, .. } => {
                    if score.is_none() {
                        debug!("engine reported no score for this position");
                    }
                    return Ok(Evaluation::from_engine_score(
                        score,
                        position.turn(),
                        pv_head.or(mv),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Send `quit`, give the process [`QUIT_TIMEOUT`] to exit, then kill it.
    fn stop(&mut self) -> Result<(), EngineError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        // The process may already be gone
        let _ = self.send(&GuiCommand::Quit);

        let deadline = Instant::now() + QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if self.process.try_wait()?.is_some() {
                info!(engine = %self.name, "engine session stopped");
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        warn!(engine = %self.name, "engine ignored quit, killing process");
        self.process.kill()?;
        self.process.wait()?;
        Ok(())
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}

/// Scoped owner of a started engine.
///
/// Stops the engine exactly once: either through [`SessionGuard::stop`] or,
/// on any other exit path (early return, `?`, panic), when dropped.
pub struct SessionGuard<E: Engine> {
    engine: E,
    stopped: bool,
}

impl<E: Engine> SessionGuard<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            stopped: false,
        }
    }

    /// Stop the engine now and report how it went.
    pub fn stop(mut self) -> Result<(), EngineError> {
        self.stopped = true;
        self.engine.stop()
    }
}

impl<E: Engine> Deref for SessionGuard<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> DerefMut for SessionGuard<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: Engine> Drop for SessionGuard<E> {
    fn drop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            if let Err(e) = self.engine.stop() {
                warn!("failed to stop engine: {}", e);
            }
        }
    }
}
