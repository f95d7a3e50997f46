//! The one total order over works. "Earliest attestation" means earliest
//! in this order: search walks works front to back and stops at the cap.

use std::cmp::Ordering;

use kratt_types::DateInterval;

use crate::catalog::CatalogEntry;

/// Ranking key for an interval. Only intervals with both bounds count as
/// dated; everything else shares the trailing `Unknown` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateKey {
    Known(i32, i32),
    Unknown,
}

impl From<&DateInterval> for DateKey {
    fn from(interval: &DateInterval) -> Self {
        match interval.bounds() {
            Some((a, b)) => Self::Known(a, b),
            None => Self::Unknown,
        }
    }
}

pub fn compare_intervals(a: &DateInterval, b: &DateInterval) -> Ordering {
    DateKey::from(a).cmp(&DateKey::from(b))
}

/// Interval, then work id, then relative path.
pub fn compare_entries(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    compare_intervals(&a.interval, &b.interval)
        .then_with(|| a.work.work_id.cmp(&b.work.work_id))
        .then_with(|| a.work.path.cmp(&b.work.path))
}

pub fn sort_entries(entries: &mut [CatalogEntry]) {
    entries.sort_by(compare_entries);
}
