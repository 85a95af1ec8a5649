//! Garment progress derived from service completion.

use crate::entities::garment_service;

/// Percentage of active services marked done, rounded to the nearest whole percent.
///
/// Removed services are ignored. Returns `None` when the garment has no active
/// services, so "no work booked" is distinguishable from "0% done".
#[must_use]
pub fn calculate_garment_progress(services: &[garment_service::Model]) -> Option<i32> {
    let (done, active) = services
        .iter()
        .filter(|s| !s.is_removed)
        .fold((0_u32, 0_u32), |(done, active), s| {
            (done + u32::from(s.is_done), active + 1)
        });

    if active == 0 {
        return None;
    }

    // done <= active, so the result is in 0..=100
    let percent = (done * 200 + active) / (active * 2);
    i32::try_from(percent).ok()
}
