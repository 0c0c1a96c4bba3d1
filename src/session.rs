//! Level orchestration
//!
//! Owns the level list, the box of the level being played and its world,
//! and turns box notifications into score, outcome and best-score updates.

use std::path::PathBuf;

use crate::best_scores::BestScores;
use crate::consts::*;
use crate::level::{LevelConfig, TileMap, ZoneTracker};
use crate::sim::{Direction, GameEvent, LevelHost, Outcome, RollingBox};

/// Per-attempt score keeper handed to the box
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    pub score: u32,
    pub outcome: Option<Outcome>,
}

impl LevelHost for Scoreboard {
    fn increment_score(&mut self, amount: u32) {
        self.score += amount;
    }

    fn report_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    fn on_event(&mut self, event: &GameEvent) {
        log::trace!("{:?}", event);
    }
}

/// The level currently being played
struct ActiveLevel {
    index: usize,
    map: TileMap,
    rolling: RollingBox<Scoreboard>,
    tracker: ZoneTracker,
    accumulator: f32,
    outcome_handled: bool,
}

pub struct Session {
    levels: Vec<LevelConfig>,
    current: Option<ActiveLevel>,
    best: BestScores,
    best_path: Option<PathBuf>,
}

impl Session {
    pub fn new(levels: Vec<LevelConfig>, best: BestScores) -> Self {
        Self {
            levels,
            current: None,
            best,
            best_path: None,
        }
    }

    /// Load best scores from `path` and save there after every new best
    pub fn with_best_scores_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.best = BestScores::load(&path);
        self.best_path = Some(path);
        self
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Start a fresh attempt at `index`. Out of range is a warned no-op.
    pub fn load_level(&mut self, index: usize) -> bool {
        let Some(level) = self.levels.get(index) else {
            log::warn!("Level index {} out of range ({} levels)", index, self.levels.len());
            return false;
        };

        // Dropping the previous box discards its pending timed work
        self.current = Some(ActiveLevel {
            index,
            map: level.tile_map(),
            rolling: RollingBox::new(level.box_config(), Scoreboard::default()),
            tracker: ZoneTracker::default(),
            accumulator: 0.0,
            outcome_handled: false,
        });
        log::info!("Level {} ({:?}) loaded", index, level.name);
        true
    }

    pub fn replay(&mut self) -> bool {
        match self.current_index() {
            Some(index) => self.load_level(index),
            None => false,
        }
    }

    pub fn next_level(&mut self) -> bool {
        match self.current_index() {
            Some(index) => self.load_level(index + 1),
            None => self.load_level(0),
        }
    }

    pub fn unload(&mut self) {
        self.current = None;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|a| a.index)
    }

    pub fn level(&self) -> Option<&LevelConfig> {
        self.current_index().and_then(|i| self.levels.get(i))
    }

    pub fn rolling_box(&self) -> Option<&RollingBox<Scoreboard>> {
        self.current.as_ref().map(|a| &a.rolling)
    }

    pub fn map(&self) -> Option<&TileMap> {
        self.current.as_ref().map(|a| &a.map)
    }

    /// Moves taken in the current attempt
    pub fn score(&self) -> u32 {
        self.rolling_box().map_or(0, |b| b.host().score)
    }

    /// Published outcome of the current attempt
    pub fn outcome(&self) -> Option<Outcome> {
        self.rolling_box().and_then(|b| b.host().outcome)
    }

    pub fn best(&self, index: usize) -> Option<u32> {
        self.best.best(index)
    }

    pub fn best_scores(&self) -> &BestScores {
        &self.best
    }

    pub fn move_box(&mut self, direction: Direction) -> bool {
        self.current
            .as_mut()
            .is_some_and(|a| a.rolling.try_move(direction))
    }

    /// Run fixed steps for `dt` seconds of host time. Returns steps run.
    pub fn update(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() {
            log::warn!("Ignoring non-finite dt {}", dt);
            return 0;
        }
        let Some(active) = self.current.as_mut() else {
            return 0;
        };
        active.accumulator += dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while substeps < MAX_SUBSTEPS {
            let Some(active) = self.current.as_mut() else {
                break;
            };
            if active.accumulator < SIM_DT {
                break;
            }
            active.accumulator -= SIM_DT;
            self.step();
            substeps += 1;
        }
        substeps
    }

    /// One fixed step: box, zone contacts, then outcome bookkeeping
    pub fn step(&mut self) {
        let Some(active) = self.current.as_mut() else {
            return;
        };

        active.rolling.step(&active.map);

        let (center, _) = active.rolling.visual_pose();
        let radius = active.rolling.tuning().zone_contact_radius;
        for zone in active.tracker.update(&active.map, center, radius) {
            active.rolling.on_zone_enter(zone);
        }

        if active.outcome_handled {
            return;
        }
        let Some(outcome) = active.rolling.host().outcome else {
            return;
        };
        active.outcome_handled = true;

        let score = active.rolling.host().score;
        match outcome {
            Outcome::Win => {
                log::info!("Level {} won in {} moves", active.index, score);
                if self.best.record(active.index, score) {
                    log::info!("New best for level {}: {}", active.index, score);
                    if let Some(path) = &self.best_path {
                        if let Err(e) = self.best.save(path) {
                            log::warn!("Could not save best scores: {}", e);
                        }
                    }
                }
            }
            Outcome::Lose => log::info!("Level {} lost after {} moves", active.index, score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PathId;

    fn level(json: &str) -> LevelConfig {
        LevelConfig::from_json(json).unwrap()
    }

    /// Stand up onto the goal with one move up
    fn one_move_win() -> LevelConfig {
        level(
            r#"{
                "name": "one",
                "tiles": [{"cell": [0, 0]}, {"cell": [0, 1], "kind": "win"}]
            }"#,
        )
    }

    fn run(session: &mut Session, secs: f32) {
        let frames = (secs / SIM_DT).ceil() as u32;
        for _ in 0..frames {
            session.update(SIM_DT);
        }
    }

    #[test]
    fn test_win_records_best() {
        let mut session = Session::new(vec![one_move_win()], BestScores::new());
        assert!(session.load_level(0));
        assert!(session.move_box(Direction::Up));
        assert_eq!(session.score(), 1);

        run(&mut session, 1.0);
        assert_eq!(session.outcome(), Some(Outcome::Win));
        assert_eq!(session.best(0), Some(1));
    }

    #[test]
    fn test_lose_keeps_best_untouched() {
        let mut session = Session::new(vec![one_move_win()], BestScores::new());
        session.load_level(0);
        session.move_box(Direction::Down);
        run(&mut session, 1.0);
        assert_eq!(session.outcome(), Some(Outcome::Lose));
        assert_eq!(session.best(0), None);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut session = Session::new(vec![one_move_win()], BestScores::new());
        assert!(!session.load_level(3));
        assert_eq!(session.current_index(), None);

        session.load_level(0);
        assert!(!session.next_level());
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn test_replay_resets_attempt() {
        let mut session = Session::new(vec![one_move_win()], BestScores::new());
        session.load_level(0);
        session.move_box(Direction::Down);
        run(&mut session, 0.05);
        assert!(session.rolling_box().unwrap().is_rolling());

        assert!(session.replay());
        assert_eq!(session.score(), 0);
        let rolling = session.rolling_box().unwrap();
        assert!(!rolling.is_rolling());
        assert_eq!(rolling.pending_work(), 0);
    }

    #[test]
    fn test_rolling_into_point_a_reveals_path() {
        let mut session = Session::new(
            vec![level(
                r#"{
                    "name": "bridge",
                    "scale": [1, 1, 1],
                    "tiles": [{"cell": [0, 0]}, {"cell": [1, 0]}],
                    "zones": [{"cell": [1, 0], "tag": "point_a"}],
                    "path_a": [[2, 0], [3, 0]]
                }"#,
            )],
            BestScores::new(),
        );
        session.load_level(0);
        session.move_box(Direction::Right);
        run(&mut session, 0.5);

        let rolling = session.rolling_box().unwrap();
        assert_eq!(rolling.pose().position.x, 1.0);
        assert!(rolling.path(PathId::A).touched);
        assert!(rolling.path(PathId::A).any_active());
    }

    #[test]
    fn test_nan_frame_does_not_stall_level() {
        let mut session = Session::new(vec![one_move_win()], BestScores::new());
        session.load_level(0);
        assert_eq!(session.update(f32::NAN), 0);
        session.move_box(Direction::Up);
        run(&mut session, 1.0);
        assert_eq!(session.outcome(), Some(Outcome::Win));
    }

    #[test]
    fn test_tutorial_loads() {
        let mut session = Session::new(vec![LevelConfig::tutorial().unwrap()], BestScores::new());
        assert!(session.next_level());
        assert_eq!(session.level().unwrap().name, "Tutorial");
        assert!(session.map().unwrap().tile((0, 0)).is_some());
    }
}
