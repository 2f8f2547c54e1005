use super::problem::Problem;
use super::types::{Schedule, ScoredSchedule};

/// Counts the desired matchups that appear in `schedule`, in list order
pub fn score_schedule(problem: &Problem, schedule: &Schedule) -> ScoredSchedule {
    let matched: Vec<_> = problem
        .desired()
        .iter()
        .filter(|d| schedule.plays(d.week, d.entity, d.opponent))
        .copied()
        .collect();

    ScoredSchedule {
        schedule: schedule.clone(),
        score: matched.len(),
        matched,
    }
}
