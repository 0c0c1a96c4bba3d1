//! Rolling Box - a grid puzzle about tipping a cuboid onto its goal
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pose, rolls, ground support, trigger paths)
//! - `level`: JSON level definitions and the reference tile world
//! - `session`: Level orchestration (score, replay, best scores)
//! - `tuning`: Data-driven timing and probe constants

pub mod best_scores;
pub mod error;
pub mod level;
pub mod session;
pub mod sim;
pub mod tuning;

pub use best_scores::BestScores;
pub use error::GameError;
pub use level::{LevelConfig, TileMap, ZoneTracker};
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Lattice spacing along X (width)
    pub const LATTICE_X: f32 = 1.0;
    /// Lattice spacing along Z (depth)
    pub const LATTICE_Z: f32 = 1.5;
    /// Height of the box center after every completed roll
    pub const BOX_REST_HEIGHT: f32 = 1.0;

    /// Top surface height of a floor tile
    pub const TILE_TOP: f32 = 0.5;
    /// Half extents of one floor tile footprint (x, z)
    pub const TILE_HALF_X: f32 = LATTICE_X / 2.0;
    pub const TILE_HALF_Z: f32 = LATTICE_Z / 2.0;
    /// Vertical thickness of a zone marker volume above its tile
    pub const ZONE_HEIGHT: f32 = 1.0;

    /// Offset of each end probe from the box center on an elongated footprint
    pub const END_PROBE_OFFSET: f32 = 0.5;
}

/// Convert a duration in seconds to whole simulation ticks (at least one)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u32 {
    (secs / consts::SIM_DT).round().max(1.0) as u32
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(deg: f32) -> f32 {
    // `+ 0.0` folds -0.0 into 0.0
    deg.rem_euclid(360.0) + 0.0
}

/// Round an angle in degrees to the nearest quarter turn, wrapped to [0, 360)
#[inline]
pub fn snap_degrees(deg: f32) -> f32 {
    wrap_degrees((deg / 90.0).round() * 90.0)
}

/// World position of a lattice cell at the given height
#[inline]
pub fn cell_to_world(cell: (i32, i32), y: f32) -> glam::Vec3 {
    glam::Vec3::new(
        cell.0 as f32 * consts::LATTICE_X,
        y,
        cell.1 as f32 * consts::LATTICE_Z,
    )
}
