//! Drives search, validation, dedup and scoring until enough distinct
//! schedules are collected, then ranks them.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SchedulerError};

use super::problem::Problem;
use super::score::score_schedule;
use super::search::{fill_schedule, SearchLimits, SearchOutcome, SearchState};
use super::types::{RankedSchedule, ScoredSchedule};
use super::validate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub limits: SearchLimits,
    /// Attempts allowed before the run gives up. `None` retries forever.
    pub max_attempts: Option<u64>,
    /// At most this many schedules are ranked and returned
    pub max_reported: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limits: SearchLimits::default(),
            max_attempts: None,
            max_reported: 10,
        }
    }
}

/// What happened to the attempts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub attempts: u64,
    /// Attempts abandoned at the backtrack cap
    pub exhausted: u64,
    pub rejected: u64,
    pub duplicates: u64,
    pub backtracks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Best first, at most `max_reported` entries
    pub schedules: Vec<RankedSchedule>,
    pub stats: RunStats,
}

/// Owns the random source and the per-attempt state for one problem
pub struct Scheduler<'p, R> {
    problem: &'p Problem,
    options: RunOptions,
    rng: R,
}

impl<'p, R: Rng> Scheduler<'p, R> {
    pub fn new(problem: &'p Problem, options: RunOptions, rng: R) -> Self {
        Self {
            problem,
            options,
            rng,
        }
    }

    /// Collects `count` distinct valid schedules and ranks them.
    ///
    /// Fails with `BudgetExhausted` (carrying what was found) if
    /// `max_attempts` runs out first.
    pub fn generate(&mut self, count: usize) -> Result<RunReport> {
        let problem = self.problem;
        let mut state = SearchState::new(problem);
        let mut found: Vec<ScoredSchedule> = Vec::with_capacity(count);
        let mut stats = RunStats::default();

        info!(
            entities = problem.entity_count(),
            weeks = problem.weeks(),
            spacing = problem.spacing(),
            pinned_weeks = problem.pinned().week_count(),
            requested = count,
            "generating schedules"
        );

        while found.len() < count {
            if self.options.max_attempts.is_some_and(|max| stats.attempts >= max) {
                warn!(
                    found = found.len(),
                    requested = count,
                    attempts = stats.attempts,
                    "attempt budget exhausted"
                );
                return Err(SchedulerError::BudgetExhausted {
                    requested: count,
                    partial: Box::new(self.rank(found, stats)),
                });
            }
            stats.attempts += 1;

            state.reset(problem);
            let outcome = fill_schedule(problem, &mut state, &self.options.limits, &mut self.rng);
            stats.backtracks += outcome.backtracks();

            if let SearchOutcome::Exhausted { backtracks } = outcome {
                stats.exhausted += 1;
                debug!(attempt = stats.attempts, backtracks, "search gave up");
                continue;
            }

            if let Err(rejection) = validate(problem, &state.schedule) {
                stats.rejected += 1;
                debug!(attempt = stats.attempts, %rejection, "not a valid schedule");
                continue;
            }

            if found.iter().any(|s| s.schedule == state.schedule) {
                stats.duplicates += 1;
                debug!(attempt = stats.attempts, "schedule already found");
                continue;
            }

            let scored = score_schedule(problem, &state.schedule);
            debug!(attempt = stats.attempts, score = scored.score, "schedule accepted");
            found.push(scored);
        }

        let report = self.rank(found, stats);
        info!(
            attempts = report.stats.attempts,
            duplicates = report.stats.duplicates,
            rejected = report.stats.rejected,
            best = report.schedules.first().map(|s| s.scored.score),
            "generation finished"
        );
        Ok(report)
    }

    /// Best score first; equal scores keep discovery order
    fn rank(&self, mut found: Vec<ScoredSchedule>, stats: RunStats) -> RunReport {
        found.sort_by(|a, b| b.score.cmp(&a.score));
        let keep = found.len().min(self.options.max_reported);

        let schedules = found
            .into_iter()
            .take(keep)
            .enumerate()
            .map(|(rank, scored)| RankedSchedule {
                id: schedule_id(rank),
                scored,
            })
            .collect();

        RunReport { schedules, stats }
    }
}

/// Spreadsheet-style column letters: 0 -> "A", 25 -> "Z", 26 -> "AA"
pub fn schedule_id(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let r = (n - 1) % 26;
        letters.push(b'A' + r as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DesiredEntry;
    use crate::schedule::problem::tests::{league, pin};
    use crate::schedule::types::Schedule;
    use crate::schedule::validate::is_valid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scheduler(problem: &Problem, options: RunOptions, seed: u64) -> Scheduler<'_, StdRng> {
        Scheduler::new(problem, options, StdRng::seed_from_u64(seed))
    }

    fn assert_round_robin(problem: &Problem, schedule: &Schedule) {
        assert!(is_valid(problem, schedule));
        for (_, week) in schedule.iter() {
            assert_eq!(week.matchups().count(), 2);
        }
        for a in 0..4 {
            let mut opponents: Vec<_> = schedule
                .iter()
                .filter_map(|(_, week)| week.opponent(a))
                .collect();
            opponents.sort_unstable();
            let expected: Vec<_> = (0..4).filter(|&b| b != a).collect();
            assert_eq!(opponents, expected);
        }
    }

    #[test]
    fn ids_use_bijective_base_26() {
        assert_eq!(schedule_id(0), "A");
        assert_eq!(schedule_id(25), "Z");
        assert_eq!(schedule_id(26), "AA");
        assert_eq!(schedule_id(27), "AB");
        assert_eq!(schedule_id(701), "ZZ");
        assert_eq!(schedule_id(702), "AAA");
    }

    #[test]
    fn four_team_round_robin() {
        let problem = Problem::new(&league(&["A", "B", "C", "D"], 1), 3, 1).unwrap();
        let report = scheduler(&problem, RunOptions::default(), 42)
            .generate(3)
            .unwrap();

        assert_eq!(report.schedules.len(), 3);
        for ranked in &report.schedules {
            assert_eq!(ranked.scored.score, 0);
            assert_round_robin(&problem, &ranked.scored.schedule);
        }
        let ids: Vec<_> = report.schedules.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn results_are_distinct() {
        // Three matchings in any order: exactly six round robins exist
        let problem = Problem::new(&league(&["A", "B", "C", "D"], 1), 3, 1).unwrap();
        let report = scheduler(&problem, RunOptions::default(), 7)
            .generate(6)
            .unwrap();

        assert_eq!(report.schedules.len(), 6);
        for (i, a) in report.schedules.iter().enumerate() {
            for b in &report.schedules[i + 1..] {
                assert_ne!(a.scored.schedule, b.scored.schedule);
            }
        }
        assert_eq!(
            report.stats.attempts,
            6 + report.stats.duplicates + report.stats.rejected + report.stats.exhausted
        );
    }

    #[test]
    fn pinned_first_week_is_respected() {
        let mut input = league(&["A", "B", "C", "D"], 1);
        pin(&mut input, 1, "A", "B");
        pin(&mut input, 1, "C", "D");
        let problem = Problem::new(&input, 3, 1).unwrap();

        let report = scheduler(&problem, RunOptions::default(), 1)
            .generate(2)
            .unwrap();

        assert_eq!(report.schedules.len(), 2);
        for ranked in &report.schedules {
            let schedule = &ranked.scored.schedule;
            assert!(schedule.plays(1, 0, 1) && schedule.plays(1, 1, 0));
            assert!(schedule.plays(1, 2, 3) && schedule.plays(1, 3, 2));
            assert_round_robin(&problem, schedule);
        }
    }

    #[test]
    fn infeasible_input_exhausts_the_budget() {
        let mut input = league(&["A", "B", "C", "D"], 0);
        for (a, b, n) in [("A", "B", 2), ("A", "C", 1), ("B", "D", 1), ("C", "D", 2)] {
            input.requirements.get_mut(a).unwrap().insert(b.to_string(), n);
            input.requirements.get_mut(b).unwrap().insert(a.to_string(), n);
        }
        let problem = Problem::new(&input, 3, 5).unwrap();
        let options = RunOptions {
            limits: SearchLimits {
                max_backtracks: Some(50),
                ..SearchLimits::default()
            },
            max_attempts: Some(5),
            ..RunOptions::default()
        };

        let err = scheduler(&problem, options, 9).generate(1).unwrap_err();
        match err {
            SchedulerError::BudgetExhausted { requested, partial } => {
                assert_eq!(requested, 1);
                assert!(partial.schedules.is_empty());
                assert_eq!(partial.stats.attempts, 5);
                assert_eq!(partial.stats.exhausted, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn asking_for_more_than_exist_keeps_partial_results() {
        let problem = Problem::new(&league(&["A", "B", "C", "D"], 1), 3, 1).unwrap();
        let options = RunOptions {
            max_attempts: Some(300),
            ..RunOptions::default()
        };

        let err = scheduler(&problem, options, 3).generate(7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "found only 6 of 7 distinct valid schedules within 300 attempts"
        );
        let SchedulerError::BudgetExhausted { partial, .. } = err else {
            panic!("expected the budget to run out");
        };
        assert_eq!(partial.schedules.len(), 6);
        assert!(partial.stats.duplicates > 0);
    }

    #[test]
    fn ranks_by_score_then_discovery_order() {
        let mut input = league(&["A", "B", "C", "D"], 1);
        input.desired = vec![
            DesiredEntry {
                week: 1,
                entity: "A".to_string(),
                opponent: "B".to_string(),
            },
            DesiredEntry {
                week: 2,
                entity: "A".to_string(),
                opponent: "C".to_string(),
            },
        ];
        let problem = Problem::new(&input, 3, 1).unwrap();
        let options = RunOptions {
            max_reported: 4,
            ..RunOptions::default()
        };

        let report = scheduler(&problem, options, 21).generate(6).unwrap();

        // Only the top four are handed on
        assert_eq!(report.schedules.len(), 4);
        let scores: Vec<_> = report.schedules.iter().map(|s| s.scored.score).collect();
        assert_eq!(scores[0], 2);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(report.schedules[0].scored.matched.len(), 2);
    }
}
