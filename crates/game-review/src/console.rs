//! Console reporters: human-readable text or one JSON object per line.

use std::io::Write;

use chess_analysis::{
    format_score, side_name, FlaggedMove, MoveRecord, PlayerStats, Reporter, ReviewEvent,
    RunStatus,
};
use serde::Serialize;
use tracing::warn;

/// Plain text report, one line per ply.
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_event(&mut self, event: &ReviewEvent) -> std::io::Result<()> {
        match event {
            ReviewEvent::Started {
                engine,
                white,
                black,
                plies,
            } => {
                writeln!(self.out, "{} vs {} ({} plies)", white, black, plies)?;
                writeln!(self.out, "Engine: {}", engine)?;
                writeln!(self.out)?;
            }
            ReviewEvent::Ply(record) => {
                let number = match record.actor {
                    shakmaty::Color::White => format!("{}.", record.move_number),
                    shakmaty::Color::Black => format!("{}...", record.move_number),
                };
                writeln!(
                    self.out,
                    "{:>6} {:<5} {:<8} {:>7}",
                    number,
                    side_name(record.actor),
                    record.notation,
                    format_score(record.post_move_score)
                )?;
            }
            ReviewEvent::Flagged(flag) => {
                writeln!(self.out, "       ! {}", flag.message())?;
            }
            ReviewEvent::Summary { white, black } => {
                writeln!(self.out)?;
                write_stats(&mut self.out, "White", white)?;
                write_stats(&mut self.out, "Black", black)?;
            }
            ReviewEvent::Finished(RunStatus::Completed) => {
                writeln!(self.out, "Analysis complete")?;
            }
            ReviewEvent::Finished(RunStatus::Aborted(reason)) => {
                writeln!(self.out, "Analysis aborted: {}", reason)?;
            }
        }
        self.out.flush()
    }
}

fn write_stats(out: &mut impl Write, side: &str, stats: &PlayerStats) -> std::io::Result<()> {
    writeln!(
        out,
        "{}: {} moves, {} inaccuracies, {} mistakes, {} blunders, avg loss {:.1} cp",
        side,
        stats.total_moves,
        stats.inaccuracies,
        stats.mistakes,
        stats.blunders,
        stats.avg_cp_loss
    )
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, event: &ReviewEvent) {
        if let Err(e) = self.write_event(event) {
            warn!("failed to write report: {}", e);
        }
    }
}

/// JSON representation of a review event.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventJson<'a> {
    Started {
        engine: &'a str,
        white: &'a str,
        black: &'a str,
        plies: usize,
    },
    Ply(PlyJson<'a>),
    Flagged(FlagJson<'a>),
    Summary {
        white: StatsJson,
        black: StatsJson,
    },
    Finished {
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'a str>,
    },
}

#[derive(Serialize)]
struct PlyJson<'a> {
    ply: usize,
    move_number: u32,
    side: &'static str,
    san: &'a str,
    uci: &'a str,
    /// Engine suggestion in the position before the move.
    best: Option<&'a str>,
    /// White-perspective score after the move, mate clamped to +/-10000.
    score_cp: Option<i32>,
    delta: Option<i32>,
    severity: &'static str,
}

impl<'a> From<&'a MoveRecord> for PlyJson<'a> {
    fn from(record: &'a MoveRecord) -> Self {
        Self {
            ply: record.ply_index,
            move_number: record.move_number,
            side: side_key(record.actor),
            san: &record.notation,
            uci: &record.uci,
            best: record.pre_move_best.as_deref(),
            score_cp: record.post_move_score,
            delta: record.delta,
            severity: record.severity.name(),
        }
    }
}

#[derive(Serialize)]
struct FlagJson<'a> {
    ply: usize,
    move_number: u32,
    side: &'static str,
    san: &'a str,
    severity: &'static str,
    drop_cp: u32,
    best: Option<&'a str>,
}

impl<'a> From<&'a FlaggedMove> for FlagJson<'a> {
    fn from(flag: &'a FlaggedMove) -> Self {
        Self {
            ply: flag.ply_index,
            move_number: flag.move_number,
            side: side_key(flag.actor),
            san: &flag.notation,
            severity: flag.severity.name(),
            drop_cp: flag.drop_cp,
            best: flag.pre_move_best.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct StatsJson {
    moves: u32,
    inaccuracies: u32,
    mistakes: u32,
    blunders: u32,
    avg_cp_loss: f64,
}

impl From<&PlayerStats> for StatsJson {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            moves: stats.total_moves,
            inaccuracies: stats.inaccuracies,
            mistakes: stats.mistakes,
            blunders: stats.blunders,
            avg_cp_loss: stats.avg_cp_loss,
        }
    }
}

fn side_key(side: shakmaty::Color) -> &'static str {
    match side {
        shakmaty::Color::White => "white",
        shakmaty::Color::Black => "black",
    }
}

/// Writes every event as a single-line JSON object.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_event(&mut self, event: &ReviewEvent) -> std::io::Result<()> {
        let json = match event {
            ReviewEvent::Started {
                engine,
                white,
                black,
                plies,
            } => EventJson::Started {
                engine,
                white,
                black,
                plies: *plies,
            },
            ReviewEvent::Ply(record) => EventJson::Ply(record.into()),
            ReviewEvent::Flagged(flag) => EventJson::Flagged(flag.into()),
            ReviewEvent::Summary { white, black } => EventJson::Summary {
                white: white.into(),
                black: black.into(),
            },
            ReviewEvent::Finished(RunStatus::Completed) => EventJson::Finished {
                status: "complete",
                reason: None,
            },
            ReviewEvent::Finished(RunStatus::Aborted(reason)) => EventJson::Finished {
                status: "aborted",
                reason: Some(reason.as_str()),
            },
        };
        serde_json::to_writer(&mut self.out, &json)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, event: &ReviewEvent) {
        if let Err(e) = self.write_event(event) {
            warn!("failed to write JSON event: {}", e);
        }
    }
}
