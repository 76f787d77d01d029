//! Copilot score: a 0-100 health metric over a flag population.
//!
//! Resolved flags earn a full point and dismissed flags half a point. Each
//! entry that still has an open flag *and* carries human feedback costs one
//! point, once per entry regardless of how many flags it has.

use std::collections::HashSet;

use copilot_core::JournalEntry;

use crate::schema::{CopilotFlag, FlagStatus};

/// Score `flags` against `entries`. An empty flag set scores 0.
pub fn copilot_score(flags: &[CopilotFlag], entries: &[JournalEntry]) -> u8 {
    if flags.is_empty() {
        return 0;
    }

    let earned: f64 = flags
        .iter()
        .map(|f| match f.status {
            FlagStatus::Resolved => 1.0,
            FlagStatus::Dismissed => 0.5,
            FlagStatus::Open => 0.0,
        })
        .sum();
    let max = flags.len() as f64;

    let open_entries: HashSet<&str> = flags
        .iter()
        .filter(|f| f.is_open())
        .map(|f| f.entry_id.as_str())
        .collect();
    let penalty = entries
        .iter()
        .filter(|e| open_entries.contains(e.id.as_str()) && e.has_feedback())
        .count() as f64;

    let pct = round_half_up((earned - penalty) / max * 100.0);
    pct.clamp(0.0, 100.0) as u8
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
