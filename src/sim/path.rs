//! Trigger-revealed path segments
//!
//! A path set is a group of floor segments that appear (rising from below)
//! or vanish together when the box touches its trigger zone.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ground::tile_hit;

/// Which of the two path sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathId {
    A,
    B,
}

/// One segment of a path set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSegment {
    /// Handle of the segment in the host scene
    pub handle: u32,
    /// Top-center position captured at level start
    pub rest: Vec3,
    /// Current top-center position (differs from `rest` while rising)
    pub position: Vec3,
    pub active: bool,
}

/// A group of segments sharing one toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSet {
    pub id: PathId,
    pub members: Vec<PathSegment>,
    pub touched: bool,
}

impl PathSet {
    /// Capture rest positions and hide every member. Repeated handles are
    /// kept once, in first-seen order.
    pub fn new(id: PathId, members: impl IntoIterator<Item = (u32, Vec3)>) -> Self {
        let mut segments: Vec<PathSegment> = Vec::new();
        for (handle, rest) in members {
            if segments.iter().any(|s| s.handle == handle) {
                log::warn!("Path {:?}: duplicate segment handle {} ignored", id, handle);
                continue;
            }
            segments.push(PathSegment {
                handle,
                rest,
                position: rest,
                active: false,
            });
        }
        Self {
            id,
            members: segments,
            touched: false,
        }
    }

    /// Flip the toggle. Untouched: drop every member `drop` below rest and
    /// activate it. Touched: deactivate every member.
    ///
    /// Returns true if this call revealed the path (the caller owns the rise).
    pub fn toggle(&mut self, drop: f32) -> bool {
        let revealing = !self.touched;
        for member in &mut self.members {
            if revealing {
                member.position = member.rest - Vec3::Y * drop;
                member.active = true;
            } else {
                member.active = false;
            }
        }
        self.touched = !self.touched;
        log::debug!(
            "Path {:?} {} ({} segments)",
            self.id,
            if revealing { "revealed" } else { "hidden" },
            self.members.len()
        );
        revealing
    }

    /// Place members along the rise, `eased` being the eased progress
    pub fn apply_rise(&mut self, eased: f32, drop: f32) {
        for member in &mut self.members {
            member.position.y = member.rest.y - drop * (1.0 - eased);
        }
    }

    /// End of the rise: every member exactly at rest
    pub fn settle(&mut self) {
        for member in &mut self.members {
            member.position = member.rest;
        }
    }

    /// Highest active segment surface hit by a downward probe
    pub fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<f32> {
        self.members
            .iter()
            .filter(|m| m.active && tile_hit(m.position, origin, max_distance))
            .map(|m| m.position.y)
            .reduce(f32::max)
    }

    pub fn any_active(&self) -> bool {
        self.members.iter().any(|m| m.active)
    }
}
