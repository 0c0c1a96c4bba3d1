//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Timed work goes through the tick scheduler, never wall-clock time
//! - Ground and zone geometry are queried through the `Ground` trait
//! - No rendering or platform dependencies

pub mod ground;
pub mod path;
pub mod pose;
pub mod schedule;
pub mod state;
pub mod tick;

pub use ground::{Ground, Support, SurfaceKind, Terrain, ZoneTag, evaluate_after_roll};
pub use path::{PathId, PathSegment, PathSet};
pub use pose::{Direction, Footprint, Pose};
pub use schedule::{Scheduler, Timeline, ease_out_back, ease_out_cubic};
pub use state::{BoxConfig, BoxPhase, Collider, EventLog, GameEvent, LevelHost, Outcome, RollingBox};
pub use tick::{TickInput, tick};
