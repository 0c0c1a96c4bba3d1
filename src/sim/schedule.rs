//! Tick-based completion scheduler
//!
//! Each independent timeline holds at most one pending completion. Timed
//! animations read their progress from here rather than keeping their own
//! clocks, so a completion and the animation it ends can never disagree.

use serde::{Deserialize, Serialize};

use super::path::PathId;

/// An independent timeline of timed work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeline {
    /// The quarter-turn roll in flight
    Roll,
    /// Delay before publishing a resolved outcome
    Outcome,
    /// Rise of a revealed path set
    Path(PathId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending {
    timeline: Timeline,
    total_ticks: u32,
    remaining_ticks: u32,
}

/// Pending completions, at most one per timeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `timeline` to complete after `ticks` steps, replacing any
    /// completion already pending on it.
    pub fn schedule(&mut self, timeline: Timeline, ticks: u32) {
        let ticks = ticks.max(1);
        if let Some(existing) = self.pending.iter_mut().find(|p| p.timeline == timeline) {
            log::debug!("Restarting pending {:?} ({} ticks left)", timeline, existing.remaining_ticks);
            existing.total_ticks = ticks;
            existing.remaining_ticks = ticks;
            return;
        }
        self.pending.push(Pending {
            timeline,
            total_ticks: ticks,
            remaining_ticks: ticks,
        });
        // Stable firing order when several complete on the same tick
        self.pending.sort_by_key(|p| p.timeline);
    }

    /// Advance one tick, returning the timelines that completed (in timeline order)
    pub fn advance(&mut self) -> Vec<Timeline> {
        let mut fired = Vec::new();
        for pending in &mut self.pending {
            pending.remaining_ticks = pending.remaining_ticks.saturating_sub(1);
            if pending.remaining_ticks == 0 {
                fired.push(pending.timeline);
            }
        }
        self.pending.retain(|p| p.remaining_ticks > 0);
        fired
    }

    pub fn is_pending(&self, timeline: Timeline) -> bool {
        self.pending.iter().any(|p| p.timeline == timeline)
    }

    /// Fraction of the pending duration elapsed, in [0, 1)
    pub fn progress(&self, timeline: Timeline) -> Option<f32> {
        self.pending
            .iter()
            .find(|p| p.timeline == timeline)
            .map(|p| (p.total_ticks - p.remaining_ticks) as f32 / p.total_ticks as f32)
    }

    /// Drop every pending completion
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Decelerating curve used for the roll
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Overshoot-then-settle curve used for path rises
#[inline]
pub fn ease_out_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let t = t.clamp(0.0, 1.0) - 1.0;
    1.0 + C3 * t.powi(3) + C1 * t.powi(2)
}
