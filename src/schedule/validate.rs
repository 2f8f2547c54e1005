//! Independent check of a finished schedule.
//!
//! Nothing here trusts the search's bookkeeping: pair counts and spacing are
//! re-derived from the schedule itself and compared against the original
//! requirement and pins.

use thiserror::Error;

use super::problem::Problem;
use super::requirements::PairRequirement;
use super::types::{EntityId, Schedule};

/// Why a schedule was turned down. Entities are reported by id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("schedule has {found} weeks, expected {expected}")]
    WeekCount { expected: usize, found: usize },

    #[error("entity {entity} has no opponent in week {week}")]
    Unscheduled { week: usize, entity: EntityId },

    #[error("entity {entity} plays itself in week {week}")]
    SelfMatchup { week: usize, entity: EntityId },

    #[error("week {week}: {entity} plays {opponent} but not the other way round")]
    Asymmetric {
        week: usize,
        entity: EntityId,
        opponent: EntityId,
    },

    #[error("{entity} plays {opponent} {found} times, required {expected}")]
    PairCount {
        entity: EntityId,
        opponent: EntityId,
        expected: u32,
        found: u32,
    },

    #[error("{entity} plays {opponent} in weeks {first} and {second}, closer than {spacing} weeks")]
    TooClose {
        entity: EntityId,
        opponent: EntityId,
        first: usize,
        second: usize,
        spacing: usize,
    },

    #[error("pinned matchup {entity} vs. {opponent} missing from week {week}")]
    PinMissing {
        week: usize,
        entity: EntityId,
        opponent: EntityId,
    },
}

/// Accepts `schedule` only if it satisfies every constraint of `problem`
pub fn validate(problem: &Problem, schedule: &Schedule) -> Result<(), Rejection> {
    if schedule.week_count() != problem.weeks() {
        return Err(Rejection::WeekCount {
            expected: problem.weeks(),
            found: schedule.week_count(),
        });
    }

    let n = problem.entity_count();
    let mut counts = PairRequirement::zeroed(n);

    // The spacing scan looks into other weeks, so every week must cover
    // every entity before any pair is inspected
    for (week, assignment) in schedule.iter() {
        if assignment.len() != n {
            return Err(Rejection::Unscheduled {
                week,
                entity: assignment.len().min(n),
            });
        }
    }

    for (week, assignment) in schedule.iter() {
        for (entity, opponent) in assignment.entries() {
            let Some(opponent) = opponent else {
                return Err(Rejection::Unscheduled { week, entity });
            };
            if opponent == entity {
                return Err(Rejection::SelfMatchup { week, entity });
            }
            if assignment.opponent(opponent) != Some(entity) {
                return Err(Rejection::Asymmetric {
                    week,
                    entity,
                    opponent,
                });
            }

            counts.set(entity, opponent, counts.get(entity, opponent) + 1);

            if let Some(other) = problem
                .spacing_window(week)
                .find(|&w| w != week && schedule.plays(w, entity, opponent))
            {
                return Err(Rejection::TooClose {
                    entity,
                    opponent,
                    first: week.min(other),
                    second: week.max(other),
                    spacing: problem.spacing(),
                });
            }
        }
    }

    let required = problem.requirement();
    for entity in 0..n {
        for opponent in 0..n {
            let (expected, found) = (required.get(entity, opponent), counts.get(entity, opponent));
            if expected != found {
                return Err(Rejection::PairCount {
                    entity,
                    opponent,
                    expected,
                    found,
                });
            }
        }
    }

    for (week, entity, opponent) in problem.pinned().iter() {
        if !schedule.plays(week, entity, opponent) || !schedule.plays(week, opponent, entity) {
            return Err(Rejection::PinMissing {
                week,
                entity,
                opponent,
            });
        }
    }

    Ok(())
}

pub fn is_valid(problem: &Problem, schedule: &Schedule) -> bool {
    validate(problem, schedule).is_ok()
}
