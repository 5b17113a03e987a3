//! Move severity classification and per-player summaries.

use shakmaty::Color;

use crate::evaluator::MoveRecord;

/// Classification of a move by how much evaluation it gave away.
///
/// Variants are ordered from harmless to worst, so `Severity::Mistake >
/// Severity::Inaccuracy` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Nothing to report (small drop, gain, or no usable delta)
    #[default]
    None,
    /// Noticeable centipawn loss
    Inaccuracy,
    /// Significant centipawn loss
    Mistake,
    /// Major centipawn loss
    Blunder,
}

impl Severity {
    /// Human-readable verb phrase used in console output.
    pub fn label(self) -> &'static str {
        match self {
            Severity::None => "played",
            Severity::Inaccuracy => "was inaccurate",
            Severity::Mistake => "made a mistake",
            Severity::Blunder => "blundered",
        }
    }

    /// Short name, e.g. for JSON output.
    pub fn name(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Inaccuracy => "inaccuracy",
            Severity::Mistake => "mistake",
            Severity::Blunder => "blunder",
        }
    }

    pub fn is_flagged(self) -> bool {
        self != Severity::None
    }
}

/// Lower bounds (inclusive, in centipawns) of each severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            inaccuracy: 50,
            mistake: 100,
            blunder: 300,
        }
    }
}

impl SeverityThresholds {
    /// Map an evaluation drop to a severity. An undefined drop is never flagged.
    pub fn classify(&self, delta: Option<i32>) -> Severity {
        match delta {
            Some(d) if d >= self.blunder => Severity::Blunder,
            Some(d) if d >= self.mistake => Severity::Mistake,
            Some(d) if d >= self.inaccuracy => Severity::Inaccuracy,
            _ => Severity::None,
        }
    }
}

/// Classify with the default 50/100/300 bands.
pub fn classify(delta: Option<i32>) -> Severity {
    SeverityThresholds::default().classify(delta)
}

/// Statistics for one side's moves in a reviewed game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    /// Plies played by this side that were evaluated
    pub total_moves: u32,
    /// Number of inaccuracies
    pub inaccuracies: u32,
    /// Number of mistakes
    pub mistakes: u32,
    /// Number of blunders
    pub blunders: u32,
    /// Mean of the positive drops over plies with a defined delta
    pub avg_cp_loss: f64,
}

impl PlayerStats {
    /// Summarize the records played by `side`.
    pub fn from_records(records: &[MoveRecord], side: Color) -> Self {
        let mut stats = PlayerStats::default();
        let mut loss_total: i64 = 0;
        let mut loss_count: i64 = 0;

        for record in records.iter().filter(|r| r.actor == side) {
            stats.total_moves += 1;
            match record.severity {
                Severity::None => {}
                Severity::Inaccuracy => stats.inaccuracies += 1,
                Severity::Mistake => stats.mistakes += 1,
                Severity::Blunder => stats.blunders += 1,
            }
            if let Some(delta) = record.delta {
                loss_total += i64::from(delta.max(0));
                loss_count += 1;
            }
        }

        if loss_count > 0 {
            stats.avg_cp_loss = loss_total as f64 / loss_count as f64;
        }
        stats
    }
}
