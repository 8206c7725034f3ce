//! Helpers shared by the standings and all-time calculators.

use std::cmp::Ordering;

use crate::models::DriverResults;

/// Highest finishing position that counts as a podium.
pub const PODIUM_POSITIONS: u32 = 3;

/// Name of the driver with the strictly smallest positive best lap.
///
/// Drivers are visited in serialized order and an equal time never displaces
/// the current holder, so the earlier driver keeps a tied lap. Returns `None`
/// when nobody set a usable lap.
pub fn fastest_lap_driver(drivers: &DriverResults) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (name, stats) in drivers.iter() {
        let Some(lap) = stats.best_lap_seconds() else {
            continue;
        };
        match best {
            Some((_, current)) if lap >= current => {}
            _ => best = Some((name, lap)),
        }
    }
    best.map(|(name, _)| name)
}

/// Points awarded by `points_table` for finishing at `position`.
///
/// Positions outside `1..=points_table.len()` score nothing.
pub fn table_points(points_table: &[u32], position: u32) -> u32 {
    if position == 0 {
        return 0;
    }
    points_table
        .get(position as usize - 1)
        .copied()
        .unwrap_or(0)
}

pub fn is_podium(position: u32) -> bool {
    position <= PODIUM_POSITIONS
}

/// Descending comparison for counters, so `sort_by` puts larger first.
pub fn descending<T: Ord>(a: &T, b: &T) -> Ordering {
    b.cmp(a)
}

/// Descending comparison for scores; NaN-safe via a total order.
pub fn descending_score(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Final deterministic tie-break: plain byte-wise name order.
pub fn by_name(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}
