//! Randomized backtracking search over weekly matchups.
//!
//! Weeks are filled in order. Within a week the first unscheduled entity (in
//! input order) is paired with an opponent drawn uniformly at random from the
//! legal candidates. When an entity has no legal opponent the search undoes
//! the last `backtrack_depth` free weeks and resumes from the earliest of them.
//! Pinned weeks are never filled or undone here.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use super::problem::Problem;
use super::requirements::ConstraintStore;
use super::types::{EntityId, Schedule};

pub const DEFAULT_BACKTRACK_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Weeks undone per dead end
    pub backtrack_depth: usize,
    /// Dead ends allowed before the attempt is abandoned. `None` searches
    /// until a schedule is found, which never happens for infeasible input.
    pub max_backtracks: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            backtrack_depth: DEFAULT_BACKTRACK_DEPTH,
            max_backtracks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every week holds a full set of matchups
    Complete { backtracks: u64 },
    /// The backtrack cap was hit first
    Exhausted { backtracks: u64 },
}

impl SearchOutcome {
    pub fn backtracks(&self) -> u64 {
        match self {
            SearchOutcome::Complete { backtracks } | SearchOutcome::Exhausted { backtracks } => {
                *backtracks
            }
        }
    }
}

/// Schedule under construction plus its remaining-requirement bookkeeping.
/// Owned by the run controller and reused across attempts.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub schedule: Schedule,
    pub store: ConstraintStore,
}

impl SearchState {
    /// A fresh state with pinned weeks already applied
    pub fn new(problem: &Problem) -> Self {
        let mut state = Self {
            schedule: Schedule::empty(problem.weeks(), problem.entity_count()),
            store: ConstraintStore::new(problem.requirement()),
        };
        problem.pinned().apply(&mut state.schedule, &mut state.store);
        state
    }

    /// Empties every week, rebuilds the store from the original requirement
    /// and re-applies the pins
    pub fn reset(&mut self, problem: &Problem) {
        self.schedule = Schedule::empty(problem.weeks(), problem.entity_count());
        self.store.reset(problem.requirement());
        problem.pinned().apply(&mut self.schedule, &mut self.store);
    }
}

/// Fills every free week of `state`, starting at week 1
pub fn fill_schedule<R: Rng + ?Sized>(
    problem: &Problem,
    state: &mut SearchState,
    limits: &SearchLimits,
    rng: &mut R,
) -> SearchOutcome {
    let depth = limits.backtrack_depth.max(1);
    let mut backtracks = 0u64;
    let mut week = 1;

    'weeks: while week <= problem.weeks() {
        if problem.pinned().contains(week) {
            week += 1;
            continue;
        }

        let mut unscheduled: Vec<EntityId> = (0..problem.entity_count()).collect();
        while let Some(&entity) = unscheduled.first() {
            let candidates = candidates(problem, state, week, entity);
            let Some(&opponent) = candidates.choose(rng) else {
                backtracks += 1;
                if limits.max_backtracks.is_some_and(|max| backtracks > max) {
                    return SearchOutcome::Exhausted { backtracks };
                }

                let restart = week.saturating_sub(depth).max(1);
                trace!(
                    week,
                    restart,
                    entity = problem.entity_name(entity),
                    "dead end"
                );
                undo_weeks(problem, state, restart, week);
                week = restart;
                continue 'weeks;
            };

            state.schedule.week_mut(week).pair(entity, opponent);
            state.store.decrement(entity, opponent);
            unscheduled.retain(|&e| e != entity && e != opponent);
        }

        week += 1;
    }

    SearchOutcome::Complete { backtracks }
}

/// Legal opponents for `entity` in `week`, in input order
fn candidates(
    problem: &Problem,
    state: &SearchState,
    week: usize,
    entity: EntityId,
) -> Vec<EntityId> {
    let current = state.schedule.week(week);
    (0..problem.entity_count())
        .filter(|&opponent| {
            opponent != entity
                && state.store.remaining(entity, opponent) > 0
                && !current.is_scheduled(opponent)
                && !problem
                    .spacing_window(week)
                    .any(|w| state.schedule.plays(w, entity, opponent))
        })
        .collect()
}

/// Clears the free weeks in `from..=to` and hands their matchups back to the store
fn undo_weeks(problem: &Problem, state: &mut SearchState, from: usize, to: usize) {
    for week in from..=to {
        if problem.pinned().contains(week) {
            continue;
        }
        let assignment = state.schedule.week_mut(week);
        for (a, b) in assignment.matchups().collect::<Vec<_>>() {
            state.store.increment(a, b);
        }
        assignment.clear();
    }
}
