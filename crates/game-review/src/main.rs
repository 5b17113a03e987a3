//! Game Review - replays a PGN game through a UCI engine.
//!
//! Every move is scored before and after it is played; moves that lose too
//! much evaluation are reported as inaccuracies, mistakes or blunders.

mod board;
mod console;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::ensure;
use board::TerminalBoard;
use chess_analysis::{
    review_file, AnalysisConfig, DeltaPerspective, EngineSession, Renderer, Reporter,
    RunOutcome, SeverityThresholds,
};
use clap::{Parser, ValueEnum};
use console::{JsonReporter, TextReporter};
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable report
    Text,
    /// One JSON object per event
    Json,
}

/// Review a recorded chess game with a UCI engine.
#[derive(Parser)]
#[command(name = "game-review")]
#[command(about = "Review a recorded chess game with a UCI engine")]
struct Cli {
    /// PGN file holding the game (the first game is used)
    pgn: PathBuf,

    /// UCI engine executable
    #[arg(short, long, default_value = "stockfish")]
    engine: PathBuf,

    /// Search time per position in milliseconds
    #[arg(short, long, default_value = "100")]
    time_ms: u64,

    /// Extra time allowed for each engine reply in milliseconds
    #[arg(long, default_value = "2000")]
    grace_ms: u64,

    /// Draw the board after every move
    #[arg(short, long)]
    board: bool,

    /// Pause between moves while drawing the board, in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Measure each drop from the side that moved
    #[arg(long)]
    mover_perspective: bool,

    /// Smallest drop (cp) reported as an inaccuracy
    #[arg(long, default_value = "50")]
    inaccuracy_cp: i32,

    /// Smallest drop (cp) reported as a mistake
    #[arg(long, default_value = "100")]
    mistake_cp: i32,

    /// Smallest drop (cp) reported as a blunder
    #[arg(long, default_value = "300")]
    blunder_cp: i32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn analysis_config(&self) -> anyhow::Result<AnalysisConfig> {
        ensure!(self.time_ms > 0, "--time-ms must be greater than zero");
        ensure!(
            self.inaccuracy_cp <= self.mistake_cp && self.mistake_cp <= self.blunder_cp,
            "thresholds must satisfy inaccuracy <= mistake <= blunder"
        );

        Ok(AnalysisConfig {
            engine_path: self.engine.clone(),
            time_limit: Duration::from_millis(self.time_ms),
            reply_grace: Duration::from_millis(self.grace_ms),
            thresholds: SeverityThresholds {
                inaccuracy: self.inaccuracy_cp,
                mistake: self.mistake_cp,
                blunder: self.blunder_cp,
            },
            pacing_delay: Duration::from_millis(self.delay_ms),
            perspective: if self.mover_perspective {
                DeltaPerspective::Mover
            } else {
                DeltaPerspective::Reference
            },
            ..AnalysisConfig::default()
        })
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(cli.log_level())
        .init();

    match run(&cli) {
        Ok(outcome) if outcome.is_complete() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let config = cli.analysis_config()?;
    tracing::info!("Engine: {}", config.engine_path.display());
    tracing::info!("Time per position: {:?}", config.time_limit);

    let mut reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Text => {
            println!("Analyzing game...");
            Box::new(TextReporter::new(io::stdout()))
        }
        OutputFormat::Json => Box::new(JsonReporter::new(io::stdout())),
    };
    let mut board = cli.board.then(|| TerminalBoard::new(io::stdout()));

    let outcome = review_file(
        &cli.pgn,
        &config,
        &mut *reporter,
        board.as_mut().map(|b| b as &mut dyn Renderer),
        EngineSession::start,
    )?;
    Ok(outcome)
}
