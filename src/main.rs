use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use league_scheduler::config::Config;
use league_scheduler::display::{print_run_summary, print_schedule, print_scoring};
use league_scheduler::export::export_report;
use league_scheduler::parser::load_league;
use league_scheduler::schedule::{Problem, RunReport, Scheduler};
use league_scheduler::{web, SchedulerError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "league-scheduler", about = "Generates league matchup schedules")]
struct Cli {
    /// TOML config; defaults are used when the file does not exist
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate schedules from the league files and write them out
    Generate {
        #[arg(long)]
        seed: Option<u64>,
        /// Number of distinct schedules to collect
        #[arg(long)]
        schedules: Option<usize>,
        #[arg(long)]
        weeks: Option<usize>,
    },
    /// Serve the JSON API and the output directory
    Web {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn load_config(path: &Path) -> Result<Config, SchedulerError> {
    if path.exists() {
        info!(path = %path.display(), "loading config");
        Config::load(path)
    } else {
        warn!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn print_report(problem: &Problem, report: &RunReport, requested: usize) {
    if let Some(best) = report.schedules.first() {
        println!("\n=== Best Schedule ({}) ===", best.id);
        print_schedule(problem, &best.scored.schedule);
    }
    for ranked in &report.schedules {
        print_scoring(problem, ranked);
    }
    print_run_summary(&report.stats, requested, report.schedules.len());
}

fn write_report(
    problem: &Problem,
    report: &RunReport,
    config: &Config,
) -> Result<(), SchedulerError> {
    print_report(problem, report, config.schedule.num_schedules);
    if report.schedules.is_empty() {
        return Ok(());
    }

    let written = export_report(problem, report, &config.output)?;
    println!("\n=== Writing Schedules to Files ===");
    for path in &written {
        println!("  - {}", path.display());
    }
    Ok(())
}

fn run_generate(config: &Config) -> Result<(), SchedulerError> {
    let input = load_league(&config.league)?;
    let problem = Problem::new(
        &input,
        config.schedule.weeks,
        config.schedule.weeks_between_matchups,
    )?;

    let rng = match config.schedule.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let options = config.schedule.run_options(config.output.max_rendered);

    println!("\n=== Running Scheduler ===");
    match Scheduler::new(&problem, options, rng).generate(config.schedule.num_schedules) {
        Ok(report) => write_report(&problem, &report, config),
        // Partial results are still written before the failure is reported
        Err(SchedulerError::BudgetExhausted { requested, partial }) => {
            write_report(&problem, &partial, config)?;
            Err(SchedulerError::BudgetExhausted { requested, partial })
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("league_scheduler=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Command::Generate {
        seed: None,
        schedules: None,
        weeks: None,
    }) {
        Command::Web { port } => {
            println!("Starting web server on port {}...", port);
            println!("Access the site at http://localhost:{}", port);
            web::start_server(port, config).await?;
        }
        Command::Generate {
            seed,
            schedules,
            weeks,
        } => {
            if let Some(seed) = seed {
                config.schedule.seed = Some(seed);
            }
            if let Some(schedules) = schedules {
                config.schedule.num_schedules = schedules;
            }
            if let Some(weeks) = weeks {
                config.schedule.weeks = weeks;
            }
            config.validate()?;
            run_generate(&config)?;
        }
    }

    Ok(())
}
