//! Garment priority ordering for the active-work dashboard.
//!
//! Ordering, most urgent first:
//! 1. Dated garments by days until due (most overdue first).
//! 2. On the same day, higher stage rank (`Ready For Pickup` > `In Progress` > `New`).
//! 3. Then higher progress.
//!
//! Undated garments come after every dated one, ordered by rank then progress.
//! `Done` garments never appear on active lists.

use crate::core::dates::days_until_due;
use crate::entities::{GarmentStage, garment};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// Sort weight of a stage; higher sorts first. `Done` is excluded from active lists.
#[must_use]
pub const fn stage_rank(stage: GarmentStage) -> i8 {
    match stage {
        GarmentStage::ReadyForPickup => 3,
        GarmentStage::InProgress => 2,
        GarmentStage::New => 1,
        GarmentStage::Done => -1,
    }
}

/// Anything the comparator can rank.
pub trait GarmentLike {
    /// Workflow stage
    fn stage(&self) -> GarmentStage;
    /// Promised pickup date
    fn due_date(&self) -> Option<NaiveDate>;
    /// Completion percentage; missing counts as zero
    fn progress(&self) -> Option<i32>;
}

impl GarmentLike for garment::Model {
    fn stage(&self) -> GarmentStage {
        self.stage
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn progress(&self) -> Option<i32> {
        self.progress
    }
}

impl<T: GarmentLike> GarmentLike for &T {
    fn stage(&self) -> GarmentStage {
        (**self).stage()
    }

    fn due_date(&self) -> Option<NaiveDate> {
        (**self).due_date()
    }

    fn progress(&self) -> Option<i32> {
        (**self).progress()
    }
}

/// Plain garment fields, for callers that do not hold an entity model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarmentSnapshot {
    /// Identifier
    pub id: i64,
    /// Workflow stage
    pub stage: GarmentStage,
    /// Promised pickup date
    pub due_date: Option<NaiveDate>,
    /// Completion percentage
    pub progress: Option<i32>,
}

impl GarmentLike for GarmentSnapshot {
    fn stage(&self) -> GarmentStage {
        self.stage
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn progress(&self) -> Option<i32> {
        self.progress
    }
}

fn rank_then_progress<A: GarmentLike, B: GarmentLike>(a: &A, b: &B) -> Ordering {
    stage_rank(b.stage())
        .cmp(&stage_rank(a.stage()))
        .then_with(|| b.progress().unwrap_or(0).cmp(&a.progress().unwrap_or(0)))
}

/// Total ordering for `sort_by`: `Less` means `a` is more urgent than `b`.
///
/// Due dates are compared by signed distance from `today`, so among overdue garments
/// the one overdue longest comes first.
pub fn compare_garment_priority<A: GarmentLike, B: GarmentLike>(
    a: &A,
    b: &B,
    today: NaiveDate,
) -> Ordering {
    match (a.due_date(), b.due_date()) {
        (Some(da), Some(db)) => days_until_due(da, today)
            .cmp(&days_until_due(db, today))
            .then_with(|| rank_then_progress(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => rank_then_progress(a, b),
    }
}

/// Drops `Done` garments and sorts the rest most-urgent first. The sort is stable.
#[must_use]
pub fn sort_active_garments<T: GarmentLike>(items: Vec<T>, today: NaiveDate) -> Vec<T> {
    let mut active: Vec<T> = items
        .into_iter()
        .filter(|g| g.stage().is_active())
        .collect();
    active.sort_by(|a, b| compare_garment_priority(a, b, today));
    active
}

/// Garment counts per workflow stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePipeline {
    /// Garments in `New`
    pub new: usize,
    /// Garments in `In Progress`
    pub in_progress: usize,
    /// Garments in `Ready For Pickup`
    pub ready_for_pickup: usize,
    /// Garments in `Done`
    pub done: usize,
}

impl StagePipeline {
    /// Count for a single stage.
    #[must_use]
    pub const fn count(&self, stage: GarmentStage) -> usize {
        match stage {
            GarmentStage::New => self.new,
            GarmentStage::InProgress => self.in_progress,
            GarmentStage::ReadyForPickup => self.ready_for_pickup,
            GarmentStage::Done => self.done,
        }
    }

    /// Garments not yet done.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.new + self.in_progress + self.ready_for_pickup
    }
}

/// Tallies garments per stage.
pub fn count_by_stage<'a, T, I>(items: I) -> StagePipeline
where
    T: GarmentLike + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .fold(StagePipeline::default(), |mut pipeline, g| {
            match g.stage() {
                GarmentStage::New => pipeline.new += 1,
                GarmentStage::InProgress => pipeline.in_progress += 1,
                GarmentStage::ReadyForPickup => pipeline.ready_for_pickup += 1,
                GarmentStage::Done => pipeline.done += 1,
            }
            pipeline
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn snap(
        id: i64,
        stage: GarmentStage,
        due_offset: Option<i64>,
        progress: Option<i32>,
    ) -> GarmentSnapshot {
        GarmentSnapshot {
            id,
            stage,
            due_date: due_offset.map(|d| today() + chrono::Duration::days(d)),
            progress,
        }
    }

    fn ids(items: &[GarmentSnapshot]) -> Vec<i64> {
        items.iter().map(|g| g.id).collect()
    }

    fn reference_fixture() -> Vec<GarmentSnapshot> {
        vec![
            snap(1, GarmentStage::ReadyForPickup, Some(-1), None),
            snap(2, GarmentStage::InProgress, Some(-1), Some(50)),
            snap(3, GarmentStage::ReadyForPickup, Some(0), None),
            snap(4, GarmentStage::InProgress, Some(0), Some(75)),
            snap(5, GarmentStage::New, Some(1), None),
            snap(6, GarmentStage::InProgress, None, Some(90)),
        ]
    }

    #[test]
    fn test_reference_order_is_preserved_from_any_input_order() {
        let expected = vec![1, 2, 3, 4, 5, 6];

        let mut shuffled = reference_fixture();
        shuffled.reverse();
        assert_eq!(ids(&sort_active_garments(shuffled, today())), expected);

        let mut rotated = reference_fixture();
        rotated.rotate_left(3);
        assert_eq!(ids(&sort_active_garments(rotated, today())), expected);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let once = sort_active_garments(reference_fixture(), today());
        let twice = sort_active_garments(once.clone(), today());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_more_overdue_sorts_first_regardless_of_stage() {
        let items = vec![
            snap(1, GarmentStage::ReadyForPickup, Some(-1), Some(100)),
            snap(2, GarmentStage::New, Some(-4), None),
            snap(3, GarmentStage::InProgress, Some(-2), Some(10)),
        ];
        assert_eq!(ids(&sort_active_garments(items, today())), vec![2, 3, 1]);
    }

    #[test]
    fn test_done_is_excluded() {
        let items = vec![
            snap(1, GarmentStage::Done, Some(-10), Some(100)),
            snap(2, GarmentStage::New, None, None),
        ];
        assert_eq!(ids(&sort_active_garments(items, today())), vec![2]);
    }

    #[test]
    fn test_undated_fall_back_to_rank_then_progress() {
        let items = vec![
            snap(1, GarmentStage::New, None, Some(99)),
            snap(2, GarmentStage::InProgress, None, Some(10)),
            snap(3, GarmentStage::InProgress, None, Some(60)),
            snap(4, GarmentStage::ReadyForPickup, None, None),
            snap(5, GarmentStage::New, Some(30), None),
        ];
        assert_eq!(ids(&sort_active_garments(items, today())), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_full_ties_compare_equal_and_keep_input_order() {
        let a = snap(1, GarmentStage::InProgress, Some(2), Some(40));
        let b = snap(2, GarmentStage::InProgress, Some(2), Some(40));
        assert_eq!(compare_garment_priority(&a, &b, today()), Ordering::Equal);
        assert_eq!(ids(&sort_active_garments(vec![b, a], today())), vec![2, 1]);
    }

    #[test]
    fn test_missing_progress_counts_as_zero() {
        let a = snap(1, GarmentStage::New, None, None);
        let b = snap(2, GarmentStage::New, None, Some(0));
        assert_eq!(compare_garment_priority(&a, &b, today()), Ordering::Equal);
    }

    #[test]
    fn test_same_due_date_ties_on_urgency_for_any_today() {
        let a = snap(1, GarmentStage::New, Some(3), None);
        let b = snap(2, GarmentStage::ReadyForPickup, Some(3), None);
        let later = today().checked_add_days(Days::new(10)).unwrap();
        // Same due date stays tied on urgency no matter how far today moves
        assert_eq!(compare_garment_priority(&a, &b, later), Ordering::Greater);
    }

    #[test]
    fn test_count_by_stage() {
        let mut items = reference_fixture();
        items.push(snap(7, GarmentStage::Done, None, Some(100)));
        let pipeline = count_by_stage(&items);
        assert_eq!(pipeline.new, 1);
        assert_eq!(pipeline.in_progress, 3);
        assert_eq!(pipeline.ready_for_pickup, 2);
        assert_eq!(pipeline.done, 1);
        assert_eq!(pipeline.active(), 6);
        assert_eq!(pipeline.count(GarmentStage::InProgress), 3);
    }
}
