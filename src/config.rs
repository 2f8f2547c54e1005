//! TOML configuration for league files, search limits and output.
//!
//! Every field has a default, so a missing or partial file still yields a
//! usable configuration:
//!
//! ```
//! use league_scheduler::config::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     [schedule]
//!     weeks = 13
//!     weeks_between_matchups = 2
//!     seed = 7
//! "#).unwrap();
//!
//! assert_eq!(config.schedule.weeks, 13);
//! assert_eq!(config.schedule.backtrack_depth, 4);
//! assert_eq!(config.output.max_rendered, 10);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::schedule::runner::RunOptions;
use crate::schedule::search::SearchLimits;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    pub league: LeagueConfig,
    pub schedule: ScheduleConfig,
    pub output: OutputConfig,
}

/// Where the league text files live
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub entities: PathBuf,
    pub requirements: PathBuf,
    pub pinned: Option<PathBuf>,
    pub desired: Option<PathBuf>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            entities: PathBuf::from("data/entities.txt"),
            requirements: PathBuf::from("data/constraints.txt"),
            pinned: None,
            desired: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub weeks: usize,
    /// Minimum number of weeks between two meetings of the same pair
    pub weeks_between_matchups: usize,
    pub num_schedules: usize,
    /// Weeks undone when the search hits a dead end
    pub backtrack_depth: usize,
    /// Dead ends tolerated in one attempt before it is abandoned
    pub max_backtracks: Option<u64>,
    /// Attempts tolerated in one run before giving up
    pub max_attempts: Option<u64>,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weeks: 13,
            weeks_between_matchups: 2,
            num_schedules: 10,
            backtrack_depth: 4,
            max_backtracks: Some(50_000),
            max_attempts: Some(2_000),
            seed: None,
        }
    }
}

impl ScheduleConfig {
    pub fn run_options(&self, max_reported: usize) -> RunOptions {
        RunOptions {
            limits: SearchLimits {
                backtrack_depth: self.backtrack_depth,
                max_backtracks: self.max_backtracks,
            },
            max_attempts: self.max_attempts,
            max_reported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Html,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub title: String,
    pub logo_path: Option<String>,
    /// Upper bound on schedules handed to the renderers
    pub max_rendered: usize,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output"),
            title: "League Schedule".to_string(),
            logo_path: None,
            max_rendered: 10,
            formats: vec![OutputFormat::Csv, OutputFormat::Html],
        }
    }
}

impl Config {
    /// Loads and validates a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(SchedulerError::Config(message.to_string()));

        if self.schedule.weeks == 0 {
            return invalid("schedule.weeks must be at least 1");
        }
        if self.schedule.num_schedules == 0 {
            return invalid("schedule.num_schedules must be at least 1");
        }
        if self.schedule.backtrack_depth == 0 {
            return invalid("schedule.backtrack_depth must be at least 1");
        }
        if self.output.max_rendered == 0 {
            return invalid("output.max_rendered must be at least 1");
        }
        Ok(())
    }
}
