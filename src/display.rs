use crate::schedule::runner::RunStats;
use crate::schedule::{DesiredMatchup, Problem, RankedSchedule, Schedule};

/// Formats a desired or scheduled matchup as "A vs. B"
pub fn format_matchup(problem: &Problem, matchup: &DesiredMatchup) -> String {
    format!(
        "{} vs. {}",
        problem.entity_name(matchup.entity),
        problem.entity_name(matchup.opponent)
    )
}

/// Prints every week, one line per entity, in input order
pub fn print_schedule(problem: &Problem, schedule: &Schedule) {
    for (week, assignment) in schedule.iter() {
        println!("Week {}", week);
        for (entity, opponent) in assignment.entries() {
            let opponent = opponent.map(|o| problem.entity_name(o)).unwrap_or("");
            println!("\t{} - {}", problem.entity_name(entity), opponent);
        }
    }
}

/// Prints the score and the desired matchups a schedule hit
pub fn print_scoring(problem: &Problem, ranked: &RankedSchedule) {
    println!("\n=== Schedule {} ===", ranked.id);
    println!("Score: {}", ranked.scored.score);
    if ranked.scored.matched.is_empty() {
        return;
    }
    println!("Matched Criteria:");
    for matchup in &ranked.scored.matched {
        println!("\tWeek {}\t{}", matchup.week, format_matchup(problem, matchup));
    }
}

pub fn print_run_summary(stats: &RunStats, requested: usize, found: usize) {
    println!("\n=== Run Summary ===");
    println!("Schedules found: {} of {}", found, requested);
    println!("Attempts: {}", stats.attempts);
    if stats.rejected > 0 {
        println!("⚠️  Not a valid schedule: {}", stats.rejected);
    }
    if stats.duplicates > 0 {
        println!("Duplicates discarded: {}", stats.duplicates);
    }
    if stats.exhausted > 0 {
        println!("Searches abandoned at the backtrack cap: {}", stats.exhausted);
    }
}
