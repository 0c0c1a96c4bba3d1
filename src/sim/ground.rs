//! Ground support evaluation
//!
//! After every roll the box probes straight down from one point (square
//! footprint) or from both ends (elongated footprint). An elongated box with
//! either end over a gap tips over even when its center is supported.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::path::PathSet;
use super::pose::{Footprint, Pose};
use crate::consts::*;
use crate::tuning::Tuning;

/// What a downward probe landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Plain floor
    Solid,
    /// Goal tile, entered standing
    Win,
    /// Tile that loses the attempt when stood on
    Hazard,
}

/// Trigger zones the box can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTag {
    PointA,
    PointB,
}

/// A probe hit: surface kind and the height of its top face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    pub kind: SurfaceKind,
    pub top: f32,
}

/// Scene queries the evaluator needs. The core never owns this geometry.
pub trait Ground {
    /// Highest surface whose top lies within `max_distance` below `origin`
    fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit>;

    /// Zones overlapping a sphere
    fn overlapping_zones(&self, center: Vec3, radius: f32) -> Vec<ZoneTag>;
}

/// Does a downward probe from `origin` strike the tile whose top center is `top`?
pub fn tile_hit(top: Vec3, origin: Vec3, max_distance: f32) -> bool {
    const EPS: f32 = 1e-4;
    (origin.x - top.x).abs() <= TILE_HALF_X + EPS
        && (origin.z - top.z).abs() <= TILE_HALF_Z + EPS
        && top.y <= origin.y
        && top.y >= origin.y - max_distance
}

/// Static ground plus the box's own path sets
pub struct Terrain<'a, G: ?Sized> {
    pub ground: &'a G,
    pub paths: &'a [PathSet],
}

impl<G: Ground + ?Sized> Ground for Terrain<'_, G> {
    fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        let mut best = self.ground.probe_down(origin, max_distance);
        for path in self.paths {
            if let Some(top) = path.probe_down(origin, max_distance) {
                if best.is_none_or(|hit| top > hit.top) {
                    best = Some(SurfaceHit {
                        kind: SurfaceKind::Solid,
                        top,
                    });
                }
            }
        }
        best
    }

    fn overlapping_zones(&self, center: Vec3, radius: f32) -> Vec<ZoneTag> {
        self.ground.overlapping_zones(center, radius)
    }
}

/// Result of one support evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Supported, nothing special underneath
    Stable,
    Win,
    Lose,
}

/// Probe down from `point`, starting slightly above it
pub fn probe<G: Ground + ?Sized>(ground: &G, point: Vec3, tuning: &Tuning) -> Option<SurfaceKind> {
    ground
        .probe_down(point + Vec3::Y * tuning.probe_lift, tuning.probe_length)
        .map(|hit| hit.kind)
}

fn standing_on<G: Ground + ?Sized>(ground: &G, pose: &Pose, kind: SurfaceKind, tuning: &Tuning) -> bool {
    pose.is_standing() && probe(ground, pose.position, tuning) == Some(kind)
}

/// Full evaluation run once right after a roll completes
pub fn evaluate_after_roll<G: Ground + ?Sized>(
    ground: &G,
    pose: &Pose,
    footprint: Footprint,
    tuning: &Tuning,
) -> Support {
    match footprint.long_axis(pose.quat()) {
        Some(axis) => {
            let ends = [
                pose.position + axis * END_PROBE_OFFSET,
                pose.position - axis * END_PROBE_OFFSET,
            ];
            let grounded = ends
                .iter()
                .filter(|&&end| probe(ground, end, tuning).is_some())
                .count();

            if grounded == ends.len() {
                Support::Stable
            } else if standing_on(ground, pose, SurfaceKind::Win, tuning) {
                // Falling, but it dropped onto the goal upright
                Support::Win
            } else {
                log::debug!("Box tipped over: {}/2 ends supported at {:?}", grounded, pose.position);
                Support::Lose
            }
        }
        None => evaluate_passive(ground, pose, tuning),
    }
}

/// Standing win/hazard check, also run every idle tick
pub fn evaluate_passive<G: Ground + ?Sized>(ground: &G, pose: &Pose, tuning: &Tuning) -> Support {
    if !pose.is_standing() {
        return Support::Stable;
    }
    match probe(ground, pose.position, tuning) {
        Some(SurfaceKind::Win) => Support::Win,
        Some(SurfaceKind::Hazard) => Support::Lose,
        _ => Support::Stable,
    }
}
