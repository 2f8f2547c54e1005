use std::collections::BTreeMap;

use super::requirements::ConstraintStore;
use super::types::{EntityId, Schedule};

/// Matchups fixed ahead of time, keyed by 1-based week.
///
/// Pinned weeks are written before the search starts and are never touched
/// by it afterwards, not even when backtracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedSchedule {
    weeks: BTreeMap<usize, Vec<(EntityId, EntityId)>>,
}

impl PinnedSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `a` against `b` for `week`. Consistency checks happen in `Problem::new`.
    pub fn pin(&mut self, week: usize, a: EntityId, b: EntityId) {
        self.weeks.entry(week).or_default().push((a, b));
    }

    pub fn contains(&self, week: usize) -> bool {
        self.weeks.contains_key(&week)
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    /// Pinned matchups for one week, empty if the week is free
    pub fn matchups(&self, week: usize) -> &[(EntityId, EntityId)] {
        self.weeks.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every pinned (week, a, b) in week order
    pub fn iter(&self) -> impl Iterator<Item = (usize, EntityId, EntityId)> + '_ {
        self.weeks
            .iter()
            .flat_map(|(&week, pairs)| pairs.iter().map(move |&(a, b)| (week, a, b)))
    }

    /// Writes the pinned matchups into `schedule` and consumes them from `store`
    pub fn apply(&self, schedule: &mut Schedule, store: &mut ConstraintStore) {
        for (week, a, b) in self.iter() {
            schedule.week_mut(week).pair(a, b);
            store.decrement(a, b);
        }
    }
}
