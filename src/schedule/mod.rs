pub mod types;
pub mod requirements;
pub mod pinned;
pub mod problem;
pub mod search;
pub mod validate;
pub mod score;
pub mod runner;

pub use types::{DesiredMatchup, EntityId, RankedSchedule, Schedule, ScoredSchedule, WeekAssignment};
pub use problem::Problem;
pub use search::{SearchLimits, SearchOutcome};
pub use validate::{is_valid, validate, Rejection};
pub use score::score_schedule;
pub use runner::{schedule_id, RunOptions, RunReport, RunStats, Scheduler};
