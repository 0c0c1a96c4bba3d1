//! Data-driven timing and probe constants
//!
//! Loaded as part of a level definition; every field falls back to its
//! default so levels only list what they change.

use serde::{Deserialize, Serialize};

use crate::secs_to_ticks;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seconds for one quarter-turn roll
    pub roll_duration: f32,
    /// Seconds between resolving an outcome and publishing it
    pub outcome_delay: f32,
    /// Seconds for a revealed path to rise into place
    pub path_rise_duration: f32,
    /// How far below rest a revealed path starts
    pub path_drop: f32,
    /// Length of a downward support probe
    pub probe_length: f32,
    /// Height above the probe point where the probe starts
    pub probe_lift: f32,
    /// Radius of the standing proximity check for PointB
    pub point_b_radius: f32,
    /// Radius the host uses to report zone contact
    pub zone_contact_radius: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            roll_duration: 0.2,
            outcome_delay: 0.2,
            path_rise_duration: 0.4,
            path_drop: 2.0,
            probe_length: 1.2,
            probe_lift: 0.1,
            point_b_radius: 0.2,
            zone_contact_radius: 0.25,
        }
    }
}

impl Tuning {
    pub fn roll_ticks(&self) -> u32 {
        secs_to_ticks(self.roll_duration)
    }

    pub fn outcome_delay_ticks(&self) -> u32 {
        secs_to_ticks(self.outcome_delay)
    }

    pub fn path_rise_ticks(&self) -> u32 {
        secs_to_ticks(self.path_rise_duration)
    }

    /// Name of the first duration that is not a positive finite number
    pub fn invalid_duration(&self) -> Option<&'static str> {
        [
            ("roll_duration", self.roll_duration),
            ("outcome_delay", self.outcome_delay),
            ("path_rise_duration", self.path_rise_duration),
        ]
        .into_iter()
        .find(|(_, secs)| !secs.is_finite() || *secs <= 0.0)
        .map(|(name, _)| name)
    }
}
