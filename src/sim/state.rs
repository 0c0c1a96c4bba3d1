//! Rolling box state and its collaborators
//!
//! The box is created once per level load and dropped on unload; dropping it
//! discards any timed work still pending in its scheduler.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::ground::ZoneTag;
use super::path::{PathId, PathSet};
use super::pose::{Direction, Footprint, Pose};
use super::schedule::{Scheduler, Timeline, ease_out_cubic};
use crate::tuning::Tuning;

/// Terminal result of one level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
}

/// Move/roll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxPhase {
    /// Accepting moves
    Idle,
    /// A quarter turn in flight; the canonical pose is still the start pose
    Rolling(Direction),
    /// Outcome decided, waiting out the publish delay
    Resolving(Outcome),
    /// Outcome published; nothing moves again
    Frozen(Outcome),
}

/// The box's physical collider. Solid while playing, a trigger once resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collider {
    pub is_trigger: bool,
}

/// Notifications and presentation requests raised by the box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Animate a quarter turn about `axis` anchored at `pivot`
    RollStarted {
        direction: Direction,
        pivot: Vec3,
        axis: Vec3,
        duration: f32,
    },
    RollFinished { pose: Pose },
    /// Segments dropped below rest and now rising over `duration`
    PathRevealed { path: PathId, duration: f32 },
    PathHidden { path: PathId },
    OutcomeScheduled { outcome: Outcome, delay: f32 },
    /// Reveal the win or lose screen
    OutcomeShown { outcome: Outcome },
}

/// Level orchestration as seen from the box
pub trait LevelHost {
    fn increment_score(&mut self, amount: u32);

    /// Called at most once per box
    fn report_outcome(&mut self, outcome: Outcome);

    /// Presentation sink (animation, screens). Ignored by default.
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Host that records everything it is told
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub score: u32,
    pub outcomes: Vec<Outcome>,
    pub events: Vec<GameEvent>,
}

impl LevelHost for EventLog {
    fn increment_score(&mut self, amount: u32) {
        self.score += amount;
    }

    fn report_outcome(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

/// Everything needed to build a box for one level attempt
#[derive(Debug, Clone, Default)]
pub struct BoxConfig {
    /// Missing start falls back to the identity pose at the origin
    pub start: Option<Pose>,
    pub scale: Vec3,
    /// Missing collider is synthesized
    pub collider: Option<Collider>,
    pub path_a: Vec<(u32, Vec3)>,
    pub path_b: Vec<(u32, Vec3)>,
    pub tuning: Tuning,
}

/// The single movable box of a level
pub struct RollingBox<H: LevelHost> {
    pub(super) pose: Pose,
    pub(super) scale: Vec3,
    pub(super) footprint: Footprint,
    pub(super) collider: Collider,
    pub(super) phase: BoxPhase,
    pub(super) paths: [PathSet; 2],
    pub(super) scheduler: Scheduler,
    /// Zone contacts reported mid-roll, applied when the roll lands
    pub(super) deferred_zones: Vec<ZoneTag>,
    pub(super) tuning: Tuning,
    pub(super) accumulator: f32,
    pub(super) time_ticks: u64,
    pub(super) host: H,
}

impl<H: LevelHost> RollingBox<H> {
    pub fn new(config: BoxConfig, host: H) -> Self {
        let pose = match config.start {
            Some(start) => Pose::at(start.position),
            None => {
                log::debug!("No start pose, using identity at origin");
                Pose::default()
            }
        };

        let mut collider = config.collider.unwrap_or_else(|| {
            log::warn!("Box has no collider, attaching a default one");
            Collider::default()
        });
        collider.is_trigger = false;

        let scale = if config.scale == Vec3::ZERO { Vec3::ONE } else { config.scale };

        Self {
            pose,
            scale,
            footprint: Footprint::from_scale(scale),
            collider,
            phase: BoxPhase::Idle,
            paths: [
                PathSet::new(PathId::A, config.path_a),
                PathSet::new(PathId::B, config.path_b),
            ],
            scheduler: Scheduler::new(),
            deferred_zones: Vec::new(),
            tuning: config.tuning,
            accumulator: 0.0,
            time_ticks: 0,
            host,
        }
    }

    /// Canonical pose; never an intermediate roll pose
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Interpolated pose for rendering, mid-roll included
    pub fn visual_pose(&self) -> (Vec3, Quat) {
        match self.phase {
            BoxPhase::Rolling(direction) => {
                let t = self.scheduler.progress(Timeline::Roll).unwrap_or(0.0);
                self.pose
                    .rolled_partial(direction, self.scale, ease_out_cubic(t))
            }
            _ => (self.pose.position, self.pose.quat()),
        }
    }

    /// Vertical drop from center to the tipping edge in the current pose
    pub fn half_height(&self) -> f32 {
        self.pose.half_height(self.scale)
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn collider(&self) -> Collider {
        self.collider
    }

    pub fn phase(&self) -> BoxPhase {
        self.phase
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self.phase, BoxPhase::Rolling(_))
    }

    /// Sticky once the outcome is published
    pub fn has_won(&self) -> bool {
        matches!(self.phase, BoxPhase::Frozen(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            BoxPhase::Resolving(outcome) | BoxPhase::Frozen(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn path(&self, id: PathId) -> &PathSet {
        &self.paths[path_index(id)]
    }

    pub fn paths(&self) -> &[PathSet] {
        &self.paths
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Timed completions still waiting
    pub fn pending_work(&self) -> usize {
        self.scheduler.len()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[inline]
pub(super) fn path_index(id: PathId) -> usize {
    match id {
        PathId::A => 0,
        PathId::B => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_falls_back_to_defaults() {
        let rolling = RollingBox::new(BoxConfig::default(), EventLog::default());
        assert_eq!(*rolling.pose(), Pose::default());
        assert_eq!(rolling.scale(), Vec3::ONE);
        assert_eq!(rolling.footprint(), Footprint::Square);
        assert!(!rolling.collider().is_trigger);
        assert_eq!(rolling.phase(), BoxPhase::Idle);
        assert!(rolling.paths().iter().all(|p| p.members.is_empty() && !p.touched));
    }

    #[test]
    fn test_new_snaps_start_and_resets_collider() {
        let config = BoxConfig {
            start: Some(Pose {
                position: Vec3::new(2.2, 5.0, 2.9),
                rotation: Vec3::new(90.0, 0.0, 0.0),
            }),
            scale: Vec3::new(1.0, 1.0, 2.0),
            collider: Some(Collider { is_trigger: true }),
            ..Default::default()
        };
        let rolling = RollingBox::new(config, EventLog::default());
        assert_eq!(rolling.pose().position, Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(rolling.pose().rotation, Vec3::ZERO);
        assert_eq!(rolling.footprint(), Footprint::ElongatedZ);
        assert!(!rolling.collider().is_trigger);
    }

    #[test]
    fn test_event_log_records() {
        let mut log = EventLog::default();
        log.increment_score(1);
        log.increment_score(1);
        log.report_outcome(Outcome::Lose);
        log.on_event(&GameEvent::PathHidden { path: PathId::B });
        assert_eq!(log.score, 2);
        assert_eq!(log.outcomes, vec![Outcome::Lose]);
        assert_eq!(log.events.len(), 1);
    }
}
