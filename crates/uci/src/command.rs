//! UCI command formatting.

use std::fmt;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Tell the engine the next position belongs to a new game.
    UciNewGame,
    /// Set up position. `fen: None` means the standard starting position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Search the current position for a fixed time in milliseconds.
    Go { movetime: u64 },
    /// Quit the engine.
    Quit,
}

impl GuiCommand {
    /// Position command for a game that started from `fen` (or the standard
    /// position) followed by `moves` in UCI notation.
    pub fn position(fen: Option<&str>, moves: &[String]) -> Self {
        GuiCommand::Position {
            fen: fen.map(str::to_string),
            moves: moves.to_vec(),
        }
    }

    /// Format command for output.
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::Position { fen, moves } => {
                let mut cmd = match fen {
                    Some(f) => format!("position fen {}", f),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    cmd.push_str(" moves ");
                    cmd.push_str(&moves.join(" "));
                }
                cmd
            }
            GuiCommand::Go { movetime } => format!("go movetime {}", movetime),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

impl fmt::Display for GuiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}
