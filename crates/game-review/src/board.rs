//! ASCII board drawn to the terminal after every ply.

use std::io::Write;

use chess_analysis::Renderer;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, File, Position, Rank, Square};
use tracing::warn;

/// Draws the position with White at the bottom.
///
/// The origin and destination of the highlighted move are wrapped in
/// brackets, e.g. `[N]`.
pub struct TerminalBoard<W: Write> {
    out: W,
}

impl<W: Write> TerminalBoard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn draw(
        &mut self,
        position: &Chess,
        highlight: Option<&UciMove>,
        message: Option<&str>,
    ) -> std::io::Result<()> {
        let marked = highlighted_squares(highlight);
        let board = position.board();

        writeln!(self.out)?;
        writeln!(self.out, "  +------------------------+")?;
        for rank in (0..8u32).rev() {
            write!(self.out, "{} |", rank + 1)?;
            for file in 0..8u32 {
                let square = Square::from_coords(File::new(file), Rank::new(rank));
                let symbol = board.piece_at(square).map_or('.', |piece| piece.char());
                if marked.contains(&square) {
                    write!(self.out, "[{}]", symbol)?;
                } else {
                    write!(self.out, " {} ", symbol)?;
                }
            }
            writeln!(self.out, "|")?;
        }
        writeln!(self.out, "  +------------------------+")?;
        writeln!(self.out, "    a  b  c  d  e  f  g  h")?;

        let to_move = match position.turn() {
            Color::White => "White",
            Color::Black => "Black",
        };
        writeln!(self.out, "{} to move", to_move)?;
        if let Some(message) = message {
            writeln!(self.out, "{}", message)?;
        }
        self.out.flush()
    }
}

fn highlighted_squares(highlight: Option<&UciMove>) -> Vec<Square> {
    match highlight {
        Some(UciMove::Normal { from, to, .. }) => vec![*from, *to],
        Some(UciMove::Put { to, .. }) => vec![*to],
        _ => Vec::new(),
    }
}

impl<W: Write> Renderer for TerminalBoard<W> {
    fn render(&mut self, position: &Chess, highlight: Option<&UciMove>, message: Option<&str>) {
        if let Err(e) = self.draw(position, highlight, message) {
            warn!("failed to draw board: {}", e);
        }
    }
}
