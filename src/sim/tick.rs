//! Fixed timestep simulation tick
//!
//! Moves, zone contacts and timed completions all funnel through here.
//! Order within one step: scheduler completions (roll, outcome, path rises),
//! then the passive standing checks if the box is idle.

use super::ground::{Ground, Support, Terrain, ZoneTag, evaluate_after_roll, evaluate_passive};
use super::path::PathId;
use super::pose::Direction;
use super::schedule::{Timeline, ease_out_back};
use super::state::{BoxPhase, GameEvent, LevelHost, Outcome, RollingBox, path_index};
use crate::consts::*;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move request, dropped unless the box is idle
    pub movement: Option<Direction>,
    /// Zones the host's collision layer saw the box enter
    pub zones_entered: Vec<ZoneTag>,
}

/// Apply one tick's input, then advance by `dt`
pub fn tick<H, G>(rolling: &mut RollingBox<H>, ground: &G, input: &TickInput, dt: f32)
where
    H: LevelHost,
    G: Ground + ?Sized,
{
    if let Some(direction) = input.movement {
        rolling.try_move(direction);
    }
    for &zone in &input.zones_entered {
        rolling.on_zone_enter(zone);
    }
    rolling.tick(ground, dt);
}

impl<H: LevelHost> RollingBox<H> {
    pub fn move_up(&mut self) {
        self.try_move(Direction::Up);
    }

    pub fn move_down(&mut self) {
        self.try_move(Direction::Down);
    }

    pub fn move_left(&mut self) {
        self.try_move(Direction::Left);
    }

    pub fn move_right(&mut self) {
        self.try_move(Direction::Right);
    }

    /// Start a roll if idle. Returns whether the move was accepted.
    pub fn try_move(&mut self, direction: Direction) -> bool {
        if self.phase != BoxPhase::Idle {
            log::trace!("Move {:?} rejected in {:?}", direction, self.phase);
            return false;
        }

        self.host.increment_score(1);

        let pivot = self.pose.roll_pivot(direction, self.scale);
        self.phase = BoxPhase::Rolling(direction);
        self.scheduler.schedule(Timeline::Roll, self.tuning.roll_ticks());
        log::debug!("Rolling {:?} from {:?}", direction, self.pose.position);

        self.host.on_event(&GameEvent::RollStarted {
            direction,
            pivot,
            axis: direction.rotation_axis(),
            duration: self.tuning.roll_duration,
        });
        true
    }

    /// Host collision layer reports the box entering a trigger zone
    pub fn on_zone_enter(&mut self, zone: ZoneTag) {
        match self.phase {
            BoxPhase::Idle => self.apply_zone_enter(zone),
            BoxPhase::Rolling(_) => self.deferred_zones.push(zone),
            BoxPhase::Resolving(_) | BoxPhase::Frozen(_) => {}
        }
    }

    fn apply_zone_enter(&mut self, zone: ZoneTag) {
        match zone {
            ZoneTag::PointA => self.toggle_path(PathId::A),
            // Contact can only hide B; the standing proximity check reveals it
            ZoneTag::PointB => {
                if self.pose.is_standing() && self.path(PathId::B).touched {
                    self.toggle_path(PathId::B);
                }
            }
        }
    }

    fn toggle_path(&mut self, id: PathId) {
        let drop = self.tuning.path_drop;
        let revealed = self.paths[path_index(id)].toggle(drop);
        if revealed {
            self.scheduler.schedule(Timeline::Path(id), self.tuning.path_rise_ticks());
            self.host.on_event(&GameEvent::PathRevealed {
                path: id,
                duration: self.tuning.path_rise_duration,
            });
        } else {
            self.host.on_event(&GameEvent::PathHidden { path: id });
        }
    }

    /// Advance by `dt` seconds of host time in fixed steps.
    /// Returns the number of steps run.
    pub fn tick<G: Ground + ?Sized>(&mut self, ground: &G, dt: f32) -> u32 {
        if !dt.is_finite() {
            log::warn!("Ignoring non-finite dt {}", dt);
            return 0;
        }
        self.accumulator += dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step(ground);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Advance exactly one fixed step
    pub fn step<G: Ground + ?Sized>(&mut self, ground: &G) {
        if self.has_won() {
            return;
        }
        self.time_ticks += 1;

        let fired = self.scheduler.advance();
        self.animate_paths();

        for timeline in fired {
            match timeline {
                Timeline::Roll => self.finish_roll(ground),
                Timeline::Outcome => self.publish_outcome(),
                Timeline::Path(id) => self.paths[path_index(id)].settle(),
            }
            if self.has_won() {
                return;
            }
        }

        if self.phase == BoxPhase::Idle {
            self.passive_checks(ground);
        }
    }

    fn animate_paths(&mut self) {
        let drop = self.tuning.path_drop;
        for path in &mut self.paths {
            if let Some(t) = self.scheduler.progress(Timeline::Path(path.id)) {
                path.apply_rise(ease_out_back(t), drop);
            }
        }
    }

    fn finish_roll<G: Ground + ?Sized>(&mut self, ground: &G) {
        let BoxPhase::Rolling(direction) = self.phase else {
            return;
        };

        self.pose = self.pose.rolled(direction, self.scale);
        self.phase = BoxPhase::Idle;
        log::debug!("Landed at {:?} rot {:?}", self.pose.position, self.pose.rotation);
        self.host.on_event(&GameEvent::RollFinished { pose: self.pose });

        for zone in std::mem::take(&mut self.deferred_zones) {
            self.apply_zone_enter(zone);
        }

        let terrain = Terrain {
            ground,
            paths: &self.paths,
        };
        match evaluate_after_roll(&terrain, &self.pose, self.footprint, &self.tuning) {
            Support::Stable => self.collider.is_trigger = false,
            Support::Win => self.resolve(Outcome::Win),
            Support::Lose => self.resolve(Outcome::Lose),
        }
    }

    /// Every idle tick while standing: PointB proximity, then win, then hazard
    fn passive_checks<G: Ground + ?Sized>(&mut self, ground: &G) {
        if !self.pose.is_standing() {
            return;
        }

        let near_b = ground
            .overlapping_zones(self.pose.position, self.tuning.point_b_radius)
            .contains(&ZoneTag::PointB);
        if near_b && !self.path(PathId::B).touched {
            self.toggle_path(PathId::B);
        }

        let terrain = Terrain {
            ground,
            paths: &self.paths,
        };
        match evaluate_passive(&terrain, &self.pose, &self.tuning) {
            Support::Stable => {}
            Support::Win => self.resolve(Outcome::Win),
            Support::Lose => self.resolve(Outcome::Lose),
        }
    }

    fn resolve(&mut self, outcome: Outcome) {
        self.collider.is_trigger = true;
        self.phase = BoxPhase::Resolving(outcome);
        self.scheduler
            .schedule(Timeline::Outcome, self.tuning.outcome_delay_ticks());
        log::info!("Resolved {:?} at {:?}", outcome, self.pose.position);
        self.host.on_event(&GameEvent::OutcomeScheduled {
            outcome,
            delay: self.tuning.outcome_delay,
        });
    }

    fn publish_outcome(&mut self) {
        let BoxPhase::Resolving(outcome) = self.phase else {
            return;
        };
        self.phase = BoxPhase::Frozen(outcome);
        self.host.report_outcome(outcome);
        self.host.on_event(&GameEvent::OutcomeShown { outcome });
        log::info!("Level {:?}", outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::TileMap;
    use crate::sim::ground::SurfaceKind;
    use crate::sim::pose::Pose;
    use crate::sim::state::{BoxConfig, Collider, EventLog};
    use crate::{cell_to_world, consts::TILE_TOP};
    use glam::Vec3;
    use proptest::prelude::*;

    const ROLL_TICKS: u32 = 24;
    const OUTCOME_TICKS: u32 = 24;
    const RISE_TICKS: u32 = 48;

    fn new_box(config: BoxConfig) -> RollingBox<EventLog> {
        RollingBox::new(config, EventLog::default())
    }

    fn steps(rolling: &mut RollingBox<EventLog>, map: &TileMap, n: u32) {
        for _ in 0..n {
            rolling.step(map);
        }
    }

    fn floor(width: i32, depth: i32) -> TileMap {
        let mut map = TileMap::default();
        for i in -width..=width {
            for j in -depth..=depth {
                map.add_tile((i, j), SurfaceKind::Solid);
            }
        }
        map
    }

    fn path_cells(cells: &[(i32, i32)]) -> Vec<(u32, Vec3)> {
        cells
            .iter()
            .enumerate()
            .map(|(i, &cell)| (i as u32, cell_to_world(cell, TILE_TOP)))
            .collect()
    }

    #[test]
    fn test_move_right_scenario() {
        let map = floor(3, 3);
        let mut rolling = new_box(BoxConfig::default());

        rolling.move_right();
        assert_eq!(rolling.host().score, 1, "score fires on acceptance");
        assert!(rolling.is_rolling());

        steps(&mut rolling, &map, ROLL_TICKS - 1);
        assert!(rolling.is_rolling());
        assert_eq!(rolling.pose().position, Vec3::new(0.0, 1.0, 0.0));

        rolling.step(&map);
        assert!(!rolling.is_rolling());
        assert_eq!(rolling.pose().position, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(rolling.pose().rotation.z, 270.0);
        assert!(!rolling.collider().is_trigger);
        assert!(rolling.host().outcomes.is_empty());
    }

    #[test]
    fn test_second_move_while_rolling_is_ignored() {
        let map = floor(3, 3);
        let mut rolling = new_box(BoxConfig::default());
        rolling.move_right();
        steps(&mut rolling, &map, 5);
        rolling.move_up();
        rolling.move_left();
        assert_eq!(rolling.host().score, 1);
        steps(&mut rolling, &map, ROLL_TICKS);
        assert_eq!(rolling.pose().position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_visual_pose_moves_mid_roll_only() {
        let map = floor(3, 3);
        let mut rolling = new_box(BoxConfig::default());
        rolling.move_right();
        steps(&mut rolling, &map, ROLL_TICKS / 2);
        let (mid, _) = rolling.visual_pose();
        assert!(mid.x > 0.0 && mid.x < 1.0);
        assert_eq!(rolling.pose().position.x, 0.0);
    }

    #[test]
    fn test_elongated_off_edge_loses_once() {
        // Strip one tile wide along X at z = 0, ending at x = 0
        let mut map = TileMap::default();
        for i in -1..=0 {
            map.add_tile((i, 0), SurfaceKind::Solid);
        }
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        });

        rolling.move_right();
        steps(&mut rolling, &map, ROLL_TICKS);
        // Tipped upright at x = 1, past the end of the strip
        assert_eq!(rolling.phase(), BoxPhase::Resolving(Outcome::Lose));
        assert!(rolling.collider().is_trigger);
        assert!(!rolling.try_move(Direction::Left));

        steps(&mut rolling, &map, OUTCOME_TICKS);
        assert_eq!(rolling.phase(), BoxPhase::Frozen(Outcome::Lose));
        assert!(rolling.has_won());
        assert_eq!(rolling.host().outcomes, vec![Outcome::Lose]);

        steps(&mut rolling, &map, 200);
        assert_eq!(rolling.host().outcomes.len(), 1);
        assert_eq!(rolling.host().score, 1);
    }

    #[test]
    fn test_elongated_supported_stays_solid() {
        let map = floor(4, 4);
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        });
        rolling.move_up();
        steps(&mut rolling, &map, ROLL_TICKS + OUTCOME_TICKS);
        assert_eq!(rolling.phase(), BoxPhase::Idle);
        assert!(!rolling.collider().is_trigger);
        assert!(rolling.host().outcomes.is_empty());
    }

    #[test]
    fn test_standing_on_win_tile_wins() {
        let mut map = floor(2, 2);
        map.add_tile((0, 1), SurfaceKind::Win);
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(1.0, 1.0, 2.0),
            ..Default::default()
        });

        rolling.move_up();
        steps(&mut rolling, &map, ROLL_TICKS);
        assert!(rolling.pose().is_standing());
        assert_eq!(rolling.outcome(), Some(Outcome::Win));

        steps(&mut rolling, &map, OUTCOME_TICKS);
        assert_eq!(rolling.host().outcomes, vec![Outcome::Win]);
        assert!(
            rolling
                .host()
                .events
                .contains(&GameEvent::OutcomeShown { outcome: Outcome::Win })
        );
    }

    #[test]
    fn test_passive_hazard_while_standing() {
        let mut map = floor(2, 2);
        map.add_tile((0, 1), SurfaceKind::Hazard);
        // Elongated boxes skip the hazard check after a roll; the idle tick catches it
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(1.0, 1.0, 2.0),
            ..Default::default()
        });
        rolling.move_up();
        steps(&mut rolling, &map, ROLL_TICKS);
        assert_eq!(rolling.outcome(), Some(Outcome::Lose));
    }

    #[test]
    fn test_point_a_reveals_then_rises_then_hides() {
        let map = floor(3, 3);
        let mut rolling = new_box(BoxConfig {
            path_a: path_cells(&[(0, 5), (0, 6)]),
            ..Default::default()
        });

        rolling.on_zone_enter(ZoneTag::PointA);
        let path = rolling.path(PathId::A);
        assert!(path.touched);
        for m in &path.members {
            assert!(m.active);
            assert_eq!(m.position.y, m.rest.y - 2.0);
        }

        steps(&mut rolling, &map, RISE_TICKS / 2);
        let y = rolling.path(PathId::A).members[0].position.y;
        assert!(y > TILE_TOP - 2.0);

        steps(&mut rolling, &map, RISE_TICKS / 2);
        assert!(rolling.path(PathId::A).members.iter().all(|m| m.position == m.rest));

        rolling.on_zone_enter(ZoneTag::PointA);
        assert!(!rolling.path(PathId::A).touched);
        assert!(!rolling.path(PathId::A).any_active());
    }

    #[test]
    fn test_zone_contact_mid_roll_is_deferred() {
        let map = floor(3, 3);
        let mut rolling = new_box(BoxConfig {
            path_a: path_cells(&[(2, 0)]),
            ..Default::default()
        });
        rolling.move_right();
        steps(&mut rolling, &map, 3);
        rolling.on_zone_enter(ZoneTag::PointA);
        assert!(!rolling.path(PathId::A).touched);

        steps(&mut rolling, &map, ROLL_TICKS);
        assert!(rolling.path(PathId::A).touched);
    }

    #[test]
    fn test_point_b_revealed_by_proximity_hidden_by_contact() {
        let mut map = floor(2, 2);
        map.add_zone((0, 1), ZoneTag::PointB);
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(1.0, 1.0, 2.0),
            path_b: path_cells(&[(1, 1)]),
            ..Default::default()
        });

        // Contact while untouched does nothing
        rolling.on_zone_enter(ZoneTag::PointB);
        assert!(!rolling.path(PathId::B).touched);

        rolling.move_up();
        steps(&mut rolling, &map, ROLL_TICKS);
        assert!(rolling.pose().is_standing());
        assert!(rolling.path(PathId::B).touched, "standing proximity reveals B");

        // Touched and standing: contact hides it again
        rolling.on_zone_enter(ZoneTag::PointB);
        assert!(!rolling.path(PathId::B).touched);
    }

    #[test]
    fn test_point_b_proximity_needs_standing() {
        let mut map = floor(2, 2);
        map.add_zone((1, 0), ZoneTag::PointB);
        let mut rolling = new_box(BoxConfig {
            path_b: path_cells(&[(2, 2)]),
            ..Default::default()
        });
        rolling.move_right();
        steps(&mut rolling, &map, ROLL_TICKS + 10);
        assert!(!rolling.pose().is_standing());
        assert!(!rolling.path(PathId::B).touched);
    }

    #[test]
    fn test_revealed_path_supports_after_rising() {
        // Floor ends at x = 0; path A bridges x = 1..=2
        let mut map = TileMap::default();
        map.add_tile((-1, 0), SurfaceKind::Solid);
        map.add_tile((0, 0), SurfaceKind::Solid);
        let mut rolling = new_box(BoxConfig {
            scale: Vec3::new(2.0, 1.0, 1.0),
            path_a: path_cells(&[(1, 0), (2, 0)]),
            ..Default::default()
        });

        rolling.on_zone_enter(ZoneTag::PointA);
        steps(&mut rolling, &map, RISE_TICKS);
        rolling.move_right();
        steps(&mut rolling, &map, ROLL_TICKS + OUTCOME_TICKS);
        assert_eq!(rolling.phase(), BoxPhase::Idle);
    }

    #[test]
    fn test_tick_accumulates_fixed_steps() {
        let map = floor(1, 1);
        let mut rolling = new_box(BoxConfig::default());
        assert_eq!(rolling.tick(&map, SIM_DT * 0.5), 0);
        assert_eq!(rolling.tick(&map, SIM_DT * 0.6), 1);
        assert_eq!(rolling.tick(&map, 1.0), MAX_SUBSTEPS);
        assert_eq!(rolling.time_ticks(), 1 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let map = floor(2, 2);
        let mut rolling = new_box(BoxConfig::default());
        assert_eq!(rolling.tick(&map, f32::NAN), 0);
        assert_eq!(rolling.tick(&map, f32::INFINITY), 0);

        rolling.move_right();
        for _ in 0..60 {
            rolling.tick(&map, 1.0 / 60.0);
        }
        assert!(!rolling.is_rolling());
        assert_eq!(rolling.pose().position.x, 1.0);
    }

    #[test]
    fn test_long_x_box_rolls_there_and_back() {
        let map = floor(4, 4);
        for start in [(0, 0), (1, 0), (-2, 0)] {
            let mut rolling = new_box(BoxConfig {
                start: Some(Pose::at(cell_to_world(start, 1.0))),
                scale: Vec3::new(2.0, 1.0, 1.0),
                ..Default::default()
            });
            let origin = rolling.pose().position;

            rolling.move_right();
            steps(&mut rolling, &map, ROLL_TICKS);
            assert_eq!(rolling.pose().position.x, origin.x + 1.0, "from {:?}", start);
            assert!((rolling.half_height() - 1.0).abs() < 1e-5);

            rolling.move_left();
            steps(&mut rolling, &map, ROLL_TICKS);
            assert_eq!(rolling.pose().position, origin, "from {:?}", start);
            assert_eq!(rolling.phase(), BoxPhase::Idle);
        }
    }

    #[test]
    fn test_tick_input_routes_moves() {
        let map = floor(2, 2);
        let mut rolling = new_box(BoxConfig {
            collider: Some(Collider::default()),
            ..Default::default()
        });
        let input = TickInput {
            movement: Some(Direction::Left),
            ..Default::default()
        };
        tick(&mut rolling, &map, &input, SIM_DT);
        assert!(rolling.is_rolling());
        for _ in 0..ROLL_TICKS {
            tick(&mut rolling, &map, &TickInput::default(), SIM_DT);
        }
        assert_eq!(rolling.pose().position.x, -1.0);
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_moves_during_roll_change_nothing(
            first in direction(),
            extra in prop::collection::vec((direction(), 0..ROLL_TICKS - 1), 1..8),
        ) {
            let map = floor(4, 4);
            let mut rolling = new_box(BoxConfig::default());
            let mut expected = new_box(BoxConfig::default());

            rolling.try_move(first);
            expected.try_move(first);
            let mut elapsed = 0;
            for (dir, wait) in extra {
                let wait = wait.min(ROLL_TICKS - 1 - elapsed);
                steps(&mut rolling, &map, wait);
                steps(&mut expected, &map, wait);
                elapsed += wait;
                prop_assert!(!rolling.try_move(dir));
                prop_assert_eq!(rolling.pose(), expected.pose());
            }
            steps(&mut rolling, &map, ROLL_TICKS);
            steps(&mut expected, &map, ROLL_TICKS);
            prop_assert_eq!(rolling.host().score, 1);
            prop_assert_eq!(rolling.pose(), expected.pose());
        }

        #[test]
        fn prop_outcome_published_at_most_once(
            moves in prop::collection::vec(direction(), 1..30),
        ) {
            // Tiny island: most walks fall off
            let map = floor(1, 1);
            let mut rolling = new_box(BoxConfig {
                scale: Vec3::new(1.0, 1.0, 2.0),
                ..Default::default()
            });
            for dir in moves {
                rolling.try_move(dir);
                steps(&mut rolling, &map, ROLL_TICKS + OUTCOME_TICKS);
            }
            prop_assert!(rolling.host().outcomes.len() <= 1);
            if rolling.has_won() {
                prop_assert_eq!(rolling.host().outcomes.len(), 1);
            }
        }

        #[test]
        fn prop_landed_pose_is_quantized(
            scale in prop::sample::select(vec![
                Vec3::ONE,
                Vec3::new(1.0, 1.0, 2.0),
                Vec3::new(2.0, 1.0, 1.0),
            ]),
            moves in prop::collection::vec(direction(), 1..20),
        ) {
            let map = floor(30, 30);
            let mut rolling = new_box(BoxConfig { scale, ..Default::default() });
            for dir in moves {
                let before = rolling.pose().position;
                let accepted = rolling.try_move(dir);
                steps(&mut rolling, &map, ROLL_TICKS);
                let pose: Pose = *rolling.pose();
                if accepted {
                    prop_assert_eq!(pose.position - before, dir.step());
                }
                prop_assert_eq!(pose.position.x.fract(), 0.0);
                prop_assert_eq!((pose.position.z / 1.5).fract(), 0.0);
                for angle in pose.rotation.to_array() {
                    prop_assert_eq!(angle % 90.0, 0.0);
                }
            }
        }
    }
}
