//! Level definitions and the reference tile world
//!
//! A level is a JSON document listing floor tiles, trigger zones and the two
//! path sets by lattice cell. [`TileMap`] answers the box's ground queries
//! and [`ZoneTracker`] plays the role of the collision layer, reporting
//! zone entries.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;
use crate::sim::ground::{Ground, SurfaceHit, SurfaceKind, ZoneTag, tile_hit};
use crate::sim::pose::Pose;
use crate::sim::state::{BoxConfig, Collider};
use crate::tuning::Tuning;
use crate::cell_to_world;

/// Lattice cell (x index, z index)
pub type Cell = (i32, i32);

fn default_surface() -> SurfaceKind {
    SurfaceKind::Solid
}

fn default_scale() -> Vec3 {
    Vec3::new(1.0, 1.0, 2.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub cell: Cell,
    #[serde(default = "default_surface")]
    pub kind: SurfaceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub cell: Cell,
    pub tag: ZoneTag,
}

/// One playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Start cell; the origin when absent
    #[serde(default)]
    pub start: Option<Cell>,
    /// Box scale; the long axis decides the footprint
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub collider: Option<Collider>,
    #[serde(default)]
    pub tiles: Vec<TileSpec>,
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,
    #[serde(default)]
    pub path_a: Vec<Cell>,
    #[serde(default)]
    pub path_b: Vec<Cell>,
    #[serde(default)]
    pub tuning: Tuning,
}

impl LevelConfig {
    /// Bundled first level
    pub fn tutorial() -> Result<Self, GameError> {
        Self::from_json(include_str!("../levels/tutorial.json"))
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn load(path: &Path) -> Result<Self, GameError> {
        let json = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
        let level = Self::from_json(&json)?;
        log::info!("Loaded level {:?} from {}", level.name, path.display());
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |reason: String| GameError::InvalidLevel {
            name: self.name.clone(),
            reason,
        };

        if self.tiles.is_empty() {
            return Err(invalid("no tiles".to_string()));
        }
        if let Some(field) = self.tuning.invalid_duration() {
            return Err(invalid(format!("{field} must be a positive number of seconds")));
        }
        if !self.scale.is_finite() || self.scale.min_element() <= 0.0 {
            return Err(invalid(format!("scale {:?} must be positive", self.scale)));
        }
        Ok(())
    }

    /// Static world for this level
    pub fn tile_map(&self) -> TileMap {
        let mut map = TileMap::default();
        for tile in &self.tiles {
            map.add_tile(tile.cell, tile.kind);
        }
        for zone in &self.zones {
            map.add_zone(zone.cell, zone.tag);
        }
        map
    }

    /// Box setup for this level
    pub fn box_config(&self) -> BoxConfig {
        let members = |cells: &[Cell]| -> Vec<(u32, Vec3)> {
            cells
                .iter()
                .enumerate()
                .map(|(i, &cell)| (i as u32, cell_to_world(cell, TILE_TOP)))
                .collect()
        };

        BoxConfig {
            start: self
                .start
                .map(|cell| Pose::at(cell_to_world(cell, BOX_REST_HEIGHT))),
            scale: self.scale,
            collider: self.collider,
            path_a: members(&self.path_a),
            path_b: members(&self.path_b),
            tuning: self.tuning.clone(),
        }
    }
}

/// A trigger zone: a cell-sized volume sitting on top of the floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub tag: ZoneTag,
    pub min: Vec3,
    pub max: Vec3,
}

impl Zone {
    fn at(cell: Cell, tag: ZoneTag) -> Self {
        let base = cell_to_world(cell, TILE_TOP);
        let half = Vec3::new(TILE_HALF_X, 0.0, TILE_HALF_Z);
        Self {
            tag,
            min: base - half,
            max: base + half + Vec3::Y * ZONE_HEIGHT,
        }
    }

    /// Sphere/box overlap
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

/// Floor tiles and trigger zones of one level
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    tiles: Vec<(Cell, SurfaceKind)>,
    zones: Vec<Zone>,
}

impl TileMap {
    /// Place a tile, replacing any tile already in that cell
    pub fn add_tile(&mut self, cell: Cell, kind: SurfaceKind) {
        if let Some(existing) = self.tiles.iter_mut().find(|(c, _)| *c == cell) {
            existing.1 = kind;
        } else {
            self.tiles.push((cell, kind));
        }
    }

    pub fn add_zone(&mut self, cell: Cell, tag: ZoneTag) {
        self.zones.push(Zone::at(cell, tag));
    }

    pub fn tile(&self, cell: Cell) -> Option<SurfaceKind> {
        self.tiles.iter().find(|(c, _)| *c == cell).map(|&(_, kind)| kind)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

impl Ground for TileMap {
    fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        self.tiles
            .iter()
            .filter(|&&(cell, _)| tile_hit(cell_to_world(cell, TILE_TOP), origin, max_distance))
            .map(|&(_, kind)| SurfaceHit { kind, top: TILE_TOP })
            .next()
    }

    fn overlapping_zones(&self, center: Vec3, radius: f32) -> Vec<ZoneTag> {
        self.zones
            .iter()
            .filter(|zone| zone.overlaps_sphere(center, radius))
            .map(|zone| zone.tag)
            .collect()
    }
}

/// Reports zone entries from successive box positions, the way a physics
/// layer raises trigger-enter callbacks.
#[derive(Debug, Clone, Default)]
pub struct ZoneTracker {
    inside: Vec<usize>,
}

impl ZoneTracker {
    /// Zones the box (centered at `center`) is now touching but was not
    /// touching on the previous update.
    pub fn update(&mut self, map: &TileMap, center: Vec3, radius: f32) -> Vec<ZoneTag> {
        let now: Vec<usize> = map
            .zones
            .iter()
            .enumerate()
            .filter(|(_, zone)| zone.overlaps_sphere(center, radius))
            .map(|(i, _)| i)
            .collect();

        let entered = now
            .iter()
            .filter(|&&i| !self.inside.contains(&i))
            .map(|&i| map.zones[i].tag)
            .collect();
        self.inside = now;
        entered
    }
}
