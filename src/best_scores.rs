//! Best move count per level
//!
//! Lower is better. Persisted as a small JSON file next to the player's data.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Lowest winning move count for each level index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestScores {
    pub entries: BTreeMap<usize, u32>,
}

impl BestScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a winning score would beat the stored best
    pub fn qualifies(&self, level: usize, score: u32) -> bool {
        self.entries.get(&level).is_none_or(|&best| score < best)
    }

    /// Record a winning score. Returns true if it became the new best.
    pub fn record(&mut self, level: usize, score: u32) -> bool {
        if !self.qualifies(level, score) {
            return false;
        }
        self.entries.insert(level, score);
        true
    }

    pub fn best(&self, level: usize) -> Option<u32> {
        self.entries.get(&level).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from `path`. A missing or unreadable file starts fresh.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("No best scores at {} ({}), starting fresh", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<BestScores>(&json) {
            Ok(scores) => {
                log::info!("Loaded best scores for {} levels", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("Ignoring corrupt best scores at {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), GameError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| GameError::io(path, e))?;
        log::info!("Best scores saved ({} levels)", self.entries.len());
        Ok(())
    }
}
