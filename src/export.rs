use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use handlebars::Handlebars;
use serde::Serialize;
use tracing::info;

use crate::config::{OutputConfig, OutputFormat};
use crate::error::Result;
use crate::schedule::{Problem, RankedSchedule, RunReport};

/// A ranked schedule with entity names instead of ids, for JSON consumers
#[derive(Debug, Clone, Serialize)]
pub struct NamedSchedule {
    pub id: String,
    pub score: usize,
    pub matched: Vec<NamedMatchup>,
    pub weeks: Vec<NamedWeek>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedMatchup {
    pub week: usize,
    pub entity: String,
    pub opponent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedWeek {
    pub week: usize,
    /// entity -> opponent
    pub opponents: BTreeMap<String, String>,
}

impl NamedSchedule {
    pub fn new(problem: &Problem, ranked: &RankedSchedule) -> Self {
        let name = |id| problem.entity_name(id).to_string();

        let matched = ranked
            .scored
            .matched
            .iter()
            .map(|m| NamedMatchup {
                week: m.week,
                entity: name(m.entity),
                opponent: name(m.opponent),
            })
            .collect();

        let weeks = ranked
            .scored
            .schedule
            .iter()
            .map(|(week, assignment)| NamedWeek {
                week,
                opponents: assignment
                    .entries()
                    .filter_map(|(e, o)| o.map(|o| (name(e), name(o))))
                    .collect(),
            })
            .collect();

        Self {
            id: ranked.id.clone(),
            score: ranked.scored.score,
            matched,
            weeks,
        }
    }
}

/// File name without extension, e.g. `scheduleB-3`
pub fn schedule_file_stem(ranked: &RankedSchedule) -> String {
    format!("schedule{}-{}", ranked.id, ranked.scored.score)
}

/// Creates the output directory if needed and removes everything inside it
pub fn clean_output_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Writes the score preamble followed by a `Week,<entities...>` table
pub fn write_schedule_csv<W: Write>(
    problem: &Problem,
    ranked: &RankedSchedule,
    mut out: W,
) -> Result<()> {
    writeln!(out, "Score: {}", ranked.scored.score)?;
    writeln!(out, "Matched Criteria:")?;
    for m in &ranked.scored.matched {
        writeln!(
            out,
            "\tWeek {}\t{} vs. {}",
            m.week,
            problem.entity_name(m.entity),
            problem.entity_name(m.opponent)
        )?;
    }
    writeln!(out)?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(&mut out);

    let mut header = vec!["Week".to_string()];
    header.extend(problem.entities().iter().cloned());
    wtr.write_record(&header)?;

    for (week, assignment) in ranked.scored.schedule.iter() {
        let mut row = vec![week.to_string()];
        row.extend(assignment.entries().map(|(_, opponent)| {
            opponent
                .map(|o| problem.entity_name(o).to_string())
                .unwrap_or_default()
        }));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    drop(wtr);
    out.flush()?;
    Ok(())
}

const SCHEDULE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{{title}} ({{id}})</title>
<style>
#logo { width: 100px; display: inline-block; }
#title { font-family: Times New Roman; float: right; display: inline-block; text-align: right; margin-right: 100px; }
#schedule { font-family: Times New Roman; border-collapse: collapse; width: 100%; margin-top: 50px; }
#schedule td, #schedule th { border: 1px solid #DDD; padding: 8px; text-align: center; height: 30px; }
#schedule tr:nth-child(even) { background-color: #F2F2F2; }
#schedule th { padding-top: 12px; padding-bottom: 12px; background-color: #0000CD; color: #FFF; }
</style>
</head>
<body>
<div>{{#if logo}}<img id="logo" src="{{logo}}">{{/if}}<h1 id="title">{{title}}</h1></div>
<table id="schedule">
<thead><tr><th style="width:{{column_width}}%;">Week</th>{{#each entities}}<th style="width:{{../column_width}}%;">{{this}}</th>{{/each}}</tr></thead>
<tbody>
{{#each rows}}<tr><td>{{week}}</td>{{#each opponents}}<td>{{this}}</td>{{/each}}</tr>
{{/each}}</tbody>
</table>
<p>Schedule {{id}}, score {{score}}. Generated {{generated}}.</p>
</body>
</html>
"#;

#[derive(Serialize)]
struct HtmlPage<'a> {
    title: &'a str,
    id: &'a str,
    score: usize,
    logo: Option<&'a str>,
    column_width: usize,
    entities: &'a [String],
    rows: Vec<HtmlRow<'a>>,
    generated: String,
}

#[derive(Serialize)]
struct HtmlRow<'a> {
    week: usize,
    /// Opponent per entity column, empty while unscheduled
    opponents: Vec<&'a str>,
}

/// Renders a printable HTML table of the schedule
pub fn render_html(
    problem: &Problem,
    ranked: &RankedSchedule,
    title: &str,
    logo_path: Option<&str>,
) -> Result<String> {
    let mut engine = Handlebars::new();
    engine.register_template_string("schedule", SCHEDULE_TEMPLATE)?;

    let rows = ranked
        .scored
        .schedule
        .iter()
        .map(|(week, assignment)| HtmlRow {
            week,
            opponents: assignment
                .entries()
                .map(|(_, opponent)| opponent.map(|o| problem.entity_name(o)).unwrap_or(""))
                .collect(),
        })
        .collect();

    let page = HtmlPage {
        title,
        id: &ranked.id,
        score: ranked.scored.score,
        logo: logo_path.filter(|p| !p.is_empty()),
        column_width: 100 / (problem.entity_count() + 1),
        entities: problem.entities(),
        rows,
        generated: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
    };

    Ok(engine.render("schedule", &page)?)
}

/// Writes one file per schedule and format into the output directory.
/// The directory is emptied first.
pub fn export_report(
    problem: &Problem,
    report: &RunReport,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    clean_output_directory(&output.path)?;

    let mut written = Vec::new();
    for ranked in &report.schedules {
        let stem = schedule_file_stem(ranked);
        for format in &output.formats {
            let path = match format {
                OutputFormat::Csv => {
                    let path = output.path.join(format!("{stem}.csv"));
                    let file = BufWriter::new(File::create(&path)?);
                    write_schedule_csv(problem, ranked, file)?;
                    path
                }
                OutputFormat::Html => {
                    let path = output.path.join(format!("{stem}.html"));
                    let html =
                        render_html(problem, ranked, &output.title, output.logo_path.as_deref())?;
                    fs::write(&path, html)?;
                    path
                }
            };
            written.push(path);
        }
    }

    info!(files = written.len(), path = %output.path.display(), "schedules written");
    Ok(written)
}
