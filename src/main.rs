//! Rolling Box headless runner
//!
//! Plays one level from a move string, or lets a seeded bot wander until the
//! attempt resolves, then prints the result.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use rolling_box::consts::SIM_DT;
use rolling_box::sim::{BoxPhase, Direction, Outcome};
use rolling_box::{BestScores, GameError, LevelConfig, Session};

#[derive(Parser)]
#[command(name = "rolling-box", version, about = "Tip a box onto its goal tile")]
struct Args {
    /// Level JSON file; the bundled tutorial when omitted
    level: Option<PathBuf>,
    /// Moves to play, e.g. "UURDL"
    #[arg(long)]
    moves: Option<String>,
    /// Seed for the random bot used when no moves are given
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Give up after this many moves
    #[arg(long, default_value_t = 200)]
    max_moves: u32,
    /// Where best scores are kept
    #[arg(long)]
    best_scores: Option<PathBuf>,
}

/// Frames the host waits between checks while a roll plays out
const FRAME_DT: f32 = 1.0 / 60.0;
/// Upper bound on frames spent settling after the last move
const SETTLE_FRAMES: u32 = 600;

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            log::error!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GameError> {
    let level = match &args.level {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::tutorial()?,
    };
    let name = level.name.clone();

    let mut session = Session::new(vec![level], BestScores::new());
    if let Some(path) = &args.best_scores {
        session = session.with_best_scores_file(path);
    }
    session.load_level(0);

    let scripted: Option<Vec<Direction>> = args
        .moves
        .as_ref()
        .map(|s| s.chars().filter_map(Direction::from_char).collect());
    let mut rng = Pcg32::seed_from_u64(args.seed);

    let mut played = 0;
    while session.outcome().is_none() && played < args.max_moves {
        let direction = match &scripted {
            Some(moves) => match moves.get(played as usize) {
                Some(&dir) => dir,
                None => break,
            },
            None => Direction::ALL[rng.random_range(0..Direction::ALL.len())],
        };

        if session.move_box(direction) {
            played += 1;
        }
        wait_until_settled(&mut session);
    }
    wait_until_settled(&mut session);

    let pose = session.rolling_box().map(|b| *b.pose()).unwrap_or_default();
    let result = match session.outcome() {
        Some(Outcome::Win) => "won",
        Some(Outcome::Lose) => "lost",
        None => "unresolved",
    };
    println!(
        "{}: {} after {} moves at {:?} (best {:?})",
        name,
        result,
        session.score(),
        pose.position,
        session.best(0)
    );
    log::debug!("Simulated {:.2}s", session.rolling_box().map_or(0, |b| b.time_ticks()) as f32 * SIM_DT);
    Ok(())
}

/// Run frames until the box can take another move or the attempt is over
fn wait_until_settled(session: &mut Session) {
    for _ in 0..SETTLE_FRAMES {
        session.update(FRAME_DT);
        let Some(rolling) = session.rolling_box() else {
            return;
        };
        if session.outcome().is_some() || rolling.phase() == BoxPhase::Idle {
            return;
        }
    }
}
