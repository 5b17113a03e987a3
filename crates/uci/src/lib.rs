//! UCI (Universal Chess Interface) protocol library, GUI side.
//!
//! This crate formats the commands a GUI sends to an engine and parses the
//! messages an engine writes back. It does no I/O of its own.
//!
//! # Commands sent to the engine
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `ucinewgame` - Reset engine state between games
//! - `position startpos|fen <fen> [moves <move>...]` - Set position
//! - `go [movetime <ms>] [depth <d>]` - Start search
//! - `stop` - Stop search
//! - `quit` - Exit engine
//!
//! # Messages read from the engine
//!
//! - `id name <name>` / `id author <author>`
//! - `uciok`, `readyok`
//! - `info ...` - Search information, see [`EngineInfo`]
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;

pub use command::GuiCommand;
pub use info::{EngineInfo, Score, ScoreBound};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Move text an engine sends in `bestmove` when the position has no legal move.
pub const NULL_BESTMOVE: &str = "(none)";

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `mv` is `None` when the engine reported `(none)`.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything this crate does not model (`option`, `copyprotection`, banners).
    Other(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    ///
    /// Blank lines yield `Ok(None)`. A `bestmove` line without a move is an
    /// error since it cannot terminate a search meaningfully.
    pub fn parse(line: &str) -> Result<Option<Self>, UciError> {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        let msg = match parts.next() {
            None => return Ok(None),
            Some("uciok") => EngineMessage::UciOk,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("id") => match parts.next() {
                Some("name") => EngineMessage::Id {
                    name: Some(parts.collect::<Vec<_>>().join(" ")),
                    author: None,
                },
                Some("author") => EngineMessage::Id {
                    name: None,
                    author: Some(parts.collect::<Vec<_>>().join(" ")),
                },
                _ => EngineMessage::Other(line.to_string()),
            },
            Some("info") => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Other(line.to_string()),
            },
            Some("bestmove") => {
                let mv = parts.next().ok_or_else(|| {
                    UciError::ParseError(format!("bestmove without move: '{}'", line))
                })?;
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(|p| p.to_string()),
                    _ => None,
                };
                EngineMessage::BestMove {
                    mv: (mv != NULL_BESTMOVE).then(|| mv.to_string()),
                    ponder,
                }
            }
            Some(_) => EngineMessage::Other(line.to_string()),
        };

        Ok(Some(msg))
    }
}
