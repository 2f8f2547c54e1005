//! Error types for league-scheduler

use std::path::PathBuf;

use thiserror::Error;

use crate::schedule::runner::RunReport;

/// Main error type for loading, configuring and running the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Configuration values that parse but make no sense
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A malformed line in one of the input text files
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Input that references unknown entities or contradicts itself
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The attempt cap ran out before enough distinct schedules were found.
    /// The partial, already ranked report is kept for rendering.
    #[error(
        "found only {} of {requested} distinct valid schedules within {} attempts",
        .partial.schedules.len(),
        .partial.stats.attempts
    )]
    BudgetExhausted {
        requested: usize,
        partial: Box<RunReport>,
    },
}

/// Result type alias for league-scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
