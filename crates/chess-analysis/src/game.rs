//! Loading a recorded game from PGN and replaying it.
//!
//! Chess rules (SAN resolution, legality, board state) come from `shakmaty`;
//! this module only reads the PGN text around them.

use std::path::{Path, PathBuf};

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, Move, Position};
use thiserror::Error;

/// Errors that can occur while loading a game.
#[derive(Error, Debug)]
pub enum GameError {
    /// The notation file does not exist.
    #[error("PGN file '{}' not found", .0.display())]
    FileNotFound(PathBuf),
    /// The notation file exists but could not be read.
    #[error("Failed to read PGN file: {0}")]
    Io(#[from] std::io::Error),
    /// No game, no moves, or notation that does not describe a legal game.
    #[error("Malformed game: {0}")]
    MalformedGame(String),
}

/// One move of the recorded game.
#[derive(Debug, Clone)]
pub struct GameMove {
    /// The move as written in the PGN, annotations stripped (e.g. "Nxf7+").
    pub san: String,
    /// The move in UCI notation (e.g. "g1f3").
    pub uci: String,
    /// The resolved legal move.
    pub mv: Move,
}

/// A recorded game: tag pairs, starting position and mainline moves.
#[derive(Debug, Clone)]
pub struct GameRecord {
    tags: Vec<(String, String)>,
    initial: Chess,
    initial_fen: Option<String>,
    moves: Vec<GameMove>,
}

impl GameRecord {
    /// Load the first game of a PGN file.
    ///
    /// # Errors
    ///
    /// - [`GameError::FileNotFound`] if `path` does not exist
    /// - [`GameError::Io`] if it cannot be read
    /// - [`GameError::MalformedGame`] if it holds no playable game
    pub fn from_pgn_file(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GameError::FileNotFound(path.to_path_buf()),
            _ => GameError::Io(e),
        })?;
        Self::from_pgn_str(&text)
    }

    /// Parse the first game of PGN text.
    pub fn from_pgn_str(text: &str) -> Result<Self, GameError> {
        let (tags, movetext) = split_first_game(text);

        let tokens = movetext_tokens(&movetext);
        if tags.is_empty() && tokens.is_empty() {
            return Err(GameError::MalformedGame("no game found in PGN".to_string()));
        }

        let initial_fen = tags
            .iter()
            .find(|(k, _)| k == "FEN")
            .map(|(_, v)| v.trim().to_string());
        let initial = match &initial_fen {
            Some(fen) => parse_fen(fen)?,
            None => Chess::default(),
        };

        let mut position = initial.clone();
        let mut moves = Vec::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            let ply = idx + 1;
            let san = SanPlus::from_ascii(token.as_bytes()).map_err(|e| {
                let msg = format!("unreadable move '{}' at ply {}: {}", token, ply, e);
                GameError::MalformedGame(msg)
            })?;
            let mv = san.san.to_move(&position).map_err(|e| {
                let msg = format!("illegal move '{}' at ply {}: {}", token, ply, e);
                GameError::MalformedGame(msg)
            })?;
            let uci = mv.to_uci(CastlingMode::Standard).to_string();
            position.play_unchecked(&mv);
            moves.push(GameMove {
                san: token.clone(),
                uci,
                mv,
            });
        }

        if moves.is_empty() {
            return Err(GameError::MalformedGame("game has no moves".to_string()));
        }

        Ok(Self {
            tags,
            initial,
            initial_fen,
            moves,
        })
    }

    /// Value of a tag pair, e.g. `tag("White")`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn white(&self) -> &str {
        self.tag("White").unwrap_or("?")
    }

    pub fn black(&self) -> &str {
        self.tag("Black").unwrap_or("?")
    }

    /// FEN of the starting position when the game did not start from the
    /// standard one.
    pub fn initial_fen(&self) -> Option<&str> {
        self.initial_fen.as_deref()
    }

    /// Mainline moves in order.
    pub fn moves(&self) -> &[GameMove] {
        &self.moves
    }

    /// Number of plies.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// A position reached while replaying a game.
///
/// Keeps the move history alongside the board so the engine sees the same
/// repetition history the players had.
#[derive(Debug, Clone)]
pub struct ReplayPosition {
    start_fen: Option<String>,
    history: Vec<String>,
    board: Chess,
}

impl ReplayPosition {
    /// The position before the first move of `game`.
    pub fn start_of(game: &GameRecord) -> Self {
        Self {
            start_fen: game.initial_fen.clone(),
            history: Vec::new(),
            board: game.initial.clone(),
        }
    }

    /// The position after playing `game_move`. The move must be legal here,
    /// which holds for moves taken from the same [`GameRecord`].
    pub fn after(&self, game_move: &GameMove) -> Self {
        let mut next = self.clone();
        next.board.play_unchecked(&game_move.mv);
        next.history.push(game_move.uci.clone());
        next
    }

    pub fn board(&self) -> &Chess {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Full move number, starting at 1 and incremented after Black moves.
    pub fn fullmoves(&self) -> u32 {
        self.board.fullmoves().get()
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    /// Moves played since the start position, in UCI notation.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The UCI `position` command describing this position.
    pub fn to_command(&self) -> uci::GuiCommand {
        uci::GuiCommand::position(self.start_fen(), &self.history)
    }
}

fn parse_fen(fen: &str) -> Result<Chess, GameError> {
    let setup = Fen::from_ascii(fen.as_bytes())
        .map_err(|e| GameError::MalformedGame(format!("invalid FEN '{}': {}", fen, e)))?;
    setup
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| GameError::MalformedGame(format!("impossible FEN position '{}': {}", fen, e)))
}

/// Split off the tag pairs and movetext of the first game in `text`.
fn split_first_game(text: &str) -> (Vec<(String, String)>, String) {
    let mut tags = Vec::new();
    let mut movetext = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            // escape line
            continue;
        }
        if trimmed.starts_with('[') && !movetext.trim().is_empty() {
            // tag section of the next game
            break;
        }
        if trimmed.starts_with('[') {
            if let Some(tag) = parse_tag(trimmed) {
                tags.push(tag);
            }
            continue;
        }
        movetext.push_str(line);
        movetext.push('\n');
    }

    (tags, movetext)
}

fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    let (name, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.replace("\\\"", "\"")))
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

/// Mainline SAN tokens of a movetext section.
///
/// Drops comments, variations, NAGs, move numbers and `!`/`?` suffixes, and
/// stops at the game termination marker.
fn movetext_tokens(movetext: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = movetext.chars().peekable();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        let delimiter = c.is_whitespace() || matches!(c, '{' | '}' | ';' | '(' | ')' | '$');
        if delimiter && variation_depth == 0 && !push_token(&mut current, &mut tokens) {
            return tokens;
        }
        match c {
            '{' => {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => variation_depth += 1,
            ')' => variation_depth = variation_depth.saturating_sub(1),
            '$' => while chars.next_if(char::is_ascii_digit).is_some() {},
            _ if delimiter => {}
            c if variation_depth == 0 => current.push(c),
            _ => {}
        }
    }
    push_token(&mut current, &mut tokens);

    tokens
}

/// Move the word in `current` onto `tokens`. Returns false at a result marker.
fn push_token(current: &mut String, tokens: &mut Vec<String>) -> bool {
    let word = std::mem::take(current);
    if is_result_token(&word) {
        return false;
    }
    // move number indication: "12." "12..." or glued as in "12.e4"
    let word = match word.rfind('.') {
        Some(idx) if word[..idx].chars().all(|c| c.is_ascii_digit() || c == '.') => {
            &word[idx + 1..]
        }
        _ => word.as_str(),
    };
    let word = word.trim_end_matches(['!', '?']);
    if is_result_token(word) {
        return false;
    }
    if word.is_empty() || word.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if word.starts_with("0-0") {
        // zero-style castling
        tokens.push(word.replace('0', "O"));
    } else {
        tokens.push(word.to_string());
    }
    true
}
