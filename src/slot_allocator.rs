// src/slot_allocator.rs
//
// Partitions the horizontal extent of the strip into parking slots of a
// target pixel width, around the intervals occupied by parked vehicles.

use crate::types::{BoundingBox, ParkingSlot};
use thiserror::Error;
use tracing::debug;

/// Margin added around every parked vehicle, as a fraction of the target
/// width. Budgeted once per fitted slot inside a gap.
pub const SAFETY_GAP_RATIO: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("target width must be positive and finite, got {0}")]
    InvalidTargetWidth(f64),
}

/// Compute the ordered, non-overlapping slots of `target_width` that fit
/// into `[0, strip_width)` around the occupied boxes.
///
/// With no occupied boxes the whole strip is tiled back-to-back with no
/// safety gap, since there is nothing to keep a distance from.
pub fn allocate(
    occupied: &[BoundingBox],
    target_width: f64,
    strip_width: u32,
) -> Result<Vec<ParkingSlot>, AllocationError> {
    if !target_width.is_finite() || target_width <= 0.0 {
        return Err(AllocationError::InvalidTargetWidth(target_width));
    }

    if occupied.is_empty() {
        return Ok(tile_empty_strip(target_width, strip_width));
    }

    let safety_gap = target_width * SAFETY_GAP_RATIO;

    let mut ranges: Vec<(f64, f64)> = occupied
        .iter()
        .map(|b| (b.x1 as f64 - safety_gap, b.x2 as f64 + safety_gap))
        .collect();
    ranges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let merged = merge_intervals(ranges);
    let free = free_intervals(&merged, strip_width as f64);

    let mut slots = Vec::new();
    for &(start, end) in &free {
        fit_slots_in_gap(start, end, target_width, safety_gap, &mut slots);
    }

    debug!(
        "Fitted {} slot(s) across {} free interval(s)",
        slots.len(),
        free.len()
    );
    Ok(slots)
}

fn tile_empty_strip(target_width: f64, strip_width: u32) -> Vec<ParkingSlot> {
    let count = (strip_width as f64 / target_width).floor() as usize;
    (0..count)
        .map(|i| ParkingSlot {
            start: (i as f64 * target_width) as i32,
            end: ((i + 1) as f64 * target_width) as i32,
        })
        .collect()
}

/// Merge intervals sorted by ascending start into maximal unions.
/// Touching intervals (start == previous end) merge.
fn merge_intervals(sorted: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Complement of the merged occupied intervals within `[0, strip_width)`.
fn free_intervals(merged: &[(f64, f64)], strip_width: f64) -> Vec<(f64, f64)> {
    let mut free = Vec::new();
    let mut cursor = 0.0f64;
    for &(start, end) in merged {
        if cursor < start {
            free.push((cursor.max(0.0), start));
        }
        cursor = cursor.max(end);
    }
    if cursor < strip_width {
        free.push((cursor, strip_width));
    }
    free
}

/// Fit as many slots as possible into one free interval. Half a safety gap
/// pads the leading edge; a full gap separates consecutive slots. Slots
/// that would poke past the interval end are dropped.
fn fit_slots_in_gap(
    start: f64,
    end: f64,
    target_width: f64,
    safety_gap: f64,
    slots: &mut Vec<ParkingSlot>,
) {
    let gap_width = end - start;
    if gap_width < target_width {
        return;
    }
    let count = ((gap_width + safety_gap) / (target_width + safety_gap)).floor() as usize;
    for i in 0..count {
        let slot_start = start + i as f64 * (target_width + safety_gap) + safety_gap / 2.0;
        let slot_end = slot_start + target_width;
        if slot_end <= end {
            slots.push(ParkingSlot {
                start: slot_start as i32,
                end: slot_end as i32,
            });
        }
    }
}
