//! Discrete box pose on the tile lattice
//!
//! The canonical pose only ever holds lattice-aligned positions and
//! quarter-turn Euler angles. Intermediate poses exist only inside a roll
//! (see [`Pose::rolled_partial`]) and are never stored.

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use crate::consts::*;
use crate::snap_degrees;

/// One of the four move directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +Z (forward)
    Up,
    /// -Z
    Down,
    /// -X
    Left,
    /// +X
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit direction of travel
    pub fn travel(self) -> Vec3 {
        match self {
            Direction::Up => Vec3::Z,
            Direction::Down => Vec3::NEG_Z,
            Direction::Left => Vec3::NEG_X,
            Direction::Right => Vec3::X,
        }
    }

    /// World axis the box rotates about, perpendicular to travel
    pub fn rotation_axis(self) -> Vec3 {
        match self {
            Direction::Up => Vec3::X,
            Direction::Down => Vec3::NEG_X,
            Direction::Left => Vec3::Z,
            Direction::Right => Vec3::NEG_Z,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Lattice offset of one roll
    pub fn step(self) -> Vec3 {
        self.travel() * Vec3::new(LATTICE_X, 0.0, LATTICE_Z)
    }

    /// Parse a move letter (`U`, `D`, `L`, `R`, case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Ground-contact shape class, derived from the box scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Footprint {
    /// 1x1, one center probe
    Square,
    /// Long along local Z, two end probes
    ElongatedZ,
    /// Long along local X, two end probes
    ElongatedX,
}

impl Footprint {
    pub fn from_scale(scale: Vec3) -> Self {
        if scale.z > 1.0 {
            Footprint::ElongatedZ
        } else if scale.x > 1.0 {
            Footprint::ElongatedX
        } else {
            Footprint::Square
        }
    }

    pub fn is_elongated(self) -> bool {
        self != Footprint::Square
    }

    /// World-space long axis for the given orientation, if elongated
    pub fn long_axis(self, rotation: Quat) -> Option<Vec3> {
        match self {
            Footprint::Square => None,
            Footprint::ElongatedZ => Some(rotation * Vec3::Z),
            Footprint::ElongatedX => Some(rotation * Vec3::X),
        }
    }
}

/// Lattice-aligned position plus quarter-turn rotation (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    /// Euler angles in degrees, Z then X then Y applied (YXZ order)
    pub rotation: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, BOX_REST_HEIGHT, 0.0),
            rotation: Vec3::ZERO,
        }
    }
}

impl Pose {
    /// Identity rotation at the snapped form of `position`
    pub fn at(position: Vec3) -> Self {
        Self {
            position: snap_position(position),
            rotation: Vec3::ZERO,
        }
    }

    /// Rotation as a quaternion
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Quantize a continuous pose: position onto the lattice at rest height,
    /// rotation onto the nearest quarter turn per axis.
    pub fn snapped(position: Vec3, rotation: Quat) -> Self {
        Self {
            position: snap_position(position),
            rotation: quarter_turn_euler(rotation),
        }
    }

    /// Re-quantize in place
    pub fn snap(&mut self) {
        *self = Self::snapped(self.position, self.quat());
    }

    /// Resting on the narrow end: X rotation is 90 or 270
    pub fn is_standing(&self) -> bool {
        let x = snap_degrees(self.rotation.x);
        x == 90.0 || x == 270.0
    }

    /// Half the world-space vertical extent of a box of `scale` in this pose
    pub fn half_height(&self, scale: Vec3) -> f32 {
        (self.quat() * scale).abs().y / 2.0
    }

    /// The edge the box tips over: half a cell toward travel, down to the base
    pub fn roll_pivot(&self, direction: Direction, scale: Vec3) -> Vec3 {
        let mut offset = direction.travel() * 0.5;
        offset.y = -self.half_height(scale);
        self.position + offset
    }

    /// Pose partway through a roll, `t` in [0, 1] (already eased).
    pub fn rolled_partial(&self, direction: Direction, scale: Vec3, t: f32) -> (Vec3, Quat) {
        let pivot = self.roll_pivot(direction, scale);
        let turn = Quat::from_axis_angle(direction.rotation_axis(), FRAC_PI_2 * t);
        let position = pivot + turn * (self.position - pivot);
        (position, turn * self.quat())
    }

    /// Canonical pose after a full quarter-turn roll.
    ///
    /// Always lands one lattice step along `direction`. A box standing two
    /// tall tips 1.5 units, so the arc's end point only supplies the rotation.
    pub fn rolled(&self, direction: Direction, scale: Vec3) -> Self {
        let (_, rotation) = self.rolled_partial(direction, scale, 1.0);
        Self::snapped(self.position + direction.step(), rotation)
    }
}

/// Snap to the X/Z lattice at rest height
pub fn snap_position(v: Vec3) -> Vec3 {
    Vec3::new(
        snap_axis(v.x, LATTICE_X),
        BOX_REST_HEIGHT,
        snap_axis(v.z, LATTICE_Z),
    )
}

/// Nearest lattice coordinate; exact half cells go to the even cell
fn snap_axis(v: f32, spacing: f32) -> f32 {
    // Float noise must not pick the side of a half-cell tie
    let cells = (v / spacing * 1e4).round() / 1e4;
    cells.round_ties_even() * spacing + 0.0
}

/// Decompose a near-axis-aligned rotation into quarter-turn YXZ Euler degrees.
///
/// The rotation matrix is rounded to a signed permutation first so gimbal
/// lock (X at +-90) cannot split the combined Y/Z turn between two axes.
/// In the locked case Z is reported as 0.
pub fn quarter_turn_euler(rotation: Quat) -> Vec3 {
    let m = Mat3::from_quat(rotation.normalize());
    let x_axis = m.x_axis.round();
    let y_axis = m.y_axis.round();
    let z_axis = m.z_axis.round();

    let sin_x = -z_axis.y;
    let (x, y, z) = if sin_x.abs() < 0.5 {
        (
            0.0,
            z_axis.x.atan2(z_axis.z),
            x_axis.y.atan2(y_axis.y),
        )
    } else {
        (
            sin_x.signum() * FRAC_PI_2,
            (-x_axis.z).atan2(x_axis.x),
            0.0,
        )
    };

    Vec3::new(
        snap_degrees(x.to_degrees()),
        snap_degrees(y.to_degrees()),
        snap_degrees(z.to_degrees()),
    )
}
