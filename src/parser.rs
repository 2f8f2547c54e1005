use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LeagueConfig;
use crate::error::{Result, SchedulerError};

/// League data by name, before entity references are resolved.
///
/// This is what any input source (text files, the web API, a scraper)
/// hands to `Problem::new`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueInput {
    pub entities: Vec<String>,
    /// entity -> opponent -> required matchups; missing pairs require none
    #[serde(default)]
    pub requirements: BTreeMap<String, BTreeMap<String, u32>>,
    /// week -> matchups fixed for that week
    #[serde(default)]
    pub pinned: BTreeMap<usize, Vec<(String, String)>>,
    #[serde(default)]
    pub desired: Vec<DesiredEntry>,
}

/// A desired matchup by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredEntry {
    pub week: usize,
    pub entity: String,
    pub opponent: String,
}

/// Loads every league file named in the config. Pins and desired matchups are optional.
pub fn load_league(config: &LeagueConfig) -> Result<LeagueInput> {
    let entities = parse_entities(&fs::read_to_string(&config.entities)?);
    let requirements = parse_requirements(
        &fs::read_to_string(&config.requirements)?,
        &config.requirements,
    )?;

    let pinned = match &config.pinned {
        Some(path) => parse_pinned(&fs::read_to_string(path)?, path)?,
        None => BTreeMap::new(),
    };
    let desired = match &config.desired {
        Some(path) => parse_desired(&fs::read_to_string(path)?, path)?,
        None => Vec::new(),
    };

    debug!(
        entities = entities.len(),
        pinned_weeks = pinned.len(),
        desired = desired.len(),
        "loaded league files"
    );

    Ok(LeagueInput {
        entities,
        requirements,
        pinned,
        desired,
    })
}

/// One entity name per line
pub fn parse_entities(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sections headed by an entity name, followed by `opponent|count` lines
pub fn parse_requirements(
    text: &str,
    path: &Path,
) -> Result<BTreeMap<String, BTreeMap<String, u32>>> {
    let mut requirements: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    let mut entity: Option<String> = None;

    for (line_no, line) in numbered_lines(text) {
        match split_pair(line) {
            None => {
                requirements.entry(line.to_string()).or_default();
                entity = Some(line.to_string());
            }
            Some((opponent, count)) => {
                let Some(entity) = &entity else {
                    return Err(parse_error(
                        path,
                        line_no,
                        format!("matchup count for {opponent} appears before any entity"),
                    ));
                };
                let count = parse_count(count)
                    .map_err(|message| parse_error(path, line_no, message))?;
                requirements
                    .entry(entity.clone())
                    .or_default()
                    .insert(opponent.to_string(), count);
            }
        }
    }

    Ok(requirements)
}

/// Sections headed by a week number, followed by `entity|opponent` lines
pub fn parse_pinned(text: &str, path: &Path) -> Result<BTreeMap<usize, Vec<(String, String)>>> {
    let mut pinned: BTreeMap<usize, Vec<(String, String)>> = BTreeMap::new();
    for (week, entity, opponent) in parse_week_sections(text, path)? {
        pinned.entry(week).or_default().push((entity, opponent));
    }
    Ok(pinned)
}

/// Same layout as the pinned file; order is kept for reporting
pub fn parse_desired(text: &str, path: &Path) -> Result<Vec<DesiredEntry>> {
    Ok(parse_week_sections(text, path)?
        .into_iter()
        .map(|(week, entity, opponent)| DesiredEntry {
            week,
            entity,
            opponent,
        })
        .collect())
}

fn parse_week_sections(text: &str, path: &Path) -> Result<Vec<(usize, String, String)>> {
    let mut entries = Vec::new();
    let mut week: Option<usize> = None;

    for (line_no, line) in numbered_lines(text) {
        match split_pair(line) {
            None => {
                let parsed: usize = line.parse().map_err(|_| {
                    parse_error(path, line_no, format!("expected a week number, found {line:?}"))
                })?;
                if parsed == 0 {
                    return Err(parse_error(path, line_no, "weeks start at 1".to_string()));
                }
                week = Some(parsed);
            }
            Some((entity, opponent)) => {
                let Some(week) = week else {
                    return Err(parse_error(
                        path,
                        line_no,
                        format!("no week is associated with the matchup {entity} vs. {opponent}"),
                    ));
                };
                entries.push((week, entity.to_string(), opponent.to_string()));
            }
        }
    }

    Ok(entries)
}

/// Non-empty trimmed lines with 1-based line numbers
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    line.split_once('|').map(|(a, b)| (a.trim(), b.trim()))
}

fn parse_count(value: &str) -> std::result::Result<u32, String> {
    let count: i64 = value
        .parse()
        .map_err(|_| format!("matchup count {value:?} is not a number"))?;
    if count < 0 {
        return Err(format!("matchup count {count} is negative"));
    }
    u32::try_from(count).map_err(|_| format!("matchup count {count} is too large"))
}

fn parse_error(path: &Path, line: usize, message: String) -> SchedulerError {
    SchedulerError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn path() -> &'static Path {
        Path::new("test.txt")
    }

    #[test]
    fn entities_skip_blank_lines() {
        let entities = parse_entities("Sharks\n\n  Jets \nOwls\n");
        assert_eq!(entities, vec!["Sharks", "Jets", "Owls"]);
    }

    #[test]
    fn requirements_are_grouped_by_entity() {
        let text = "Sharks\nJets|2\nOwls|1\n\nJets\nSharks|2\n";
        let req = parse_requirements(text, path()).unwrap();

        assert_eq!(req["Sharks"]["Jets"], 2);
        assert_eq!(req["Sharks"]["Owls"], 1);
        assert_eq!(req["Jets"]["Sharks"], 2);
        assert!(!req["Jets"].contains_key("Owls"));
    }

    #[test]
    fn requirement_before_entity_is_rejected() {
        let err = parse_requirements("Jets|2\n", path()).unwrap_err();
        match err {
            SchedulerError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_and_garbage_counts_are_rejected() {
        let err = parse_requirements("Sharks\nJets|-1\n", path()).unwrap_err();
        assert!(err.to_string().contains("negative"), "{err}");

        let err = parse_requirements("Sharks\n\nJets|two\n", path()).unwrap_err();
        assert!(err.to_string().contains("test.txt:3"), "{err}");
    }

    #[test]
    fn pinned_weeks_collect_matchups() {
        let text = "1\nSharks|Jets\nOwls|Bears\n3\nSharks|Owls\n";
        let pinned = parse_pinned(text, path()).unwrap();

        assert_eq!(pinned.len(), 2);
        assert_eq!(pinned[&1].len(), 2);
        assert_eq!(pinned[&3], vec![("Sharks".to_string(), "Owls".to_string())]);
    }

    #[test]
    fn matchup_before_week_is_rejected() {
        let err = parse_desired("Sharks|Jets\n", path()).unwrap_err();
        assert!(err.to_string().contains("no week"), "{err}");

        let err = parse_desired("zero\nSharks|Jets\n", path()).unwrap_err();
        assert!(err.to_string().contains("week number"), "{err}");

        let err = parse_desired("0\n", path()).unwrap_err();
        assert!(err.to_string().contains("start at 1"), "{err}");
    }

    #[test]
    fn desired_keeps_file_order() {
        let desired = parse_desired("2\nOwls|Jets\n1\nSharks|Bears\n", path()).unwrap();
        assert_eq!(desired[0].week, 2);
        assert_eq!(desired[1].entity, "Sharks");
    }

    #[test]
    fn load_league_reads_optional_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let path = dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(body.as_bytes()).unwrap();
            path
        };

        let config = LeagueConfig {
            entities: write("entities.txt", "A\nB\n"),
            requirements: write("constraints.txt", "A\nB|1\nB\nA|1\n"),
            pinned: None,
            desired: Some(write("scoring.txt", "1\nA|B\n")),
        };

        let league = load_league(&config).unwrap();
        assert_eq!(league.entities, vec!["A", "B"]);
        assert_eq!(league.requirements["B"]["A"], 1);
        assert!(league.pinned.is_empty());
        assert_eq!(league.desired.len(), 1);
    }
}
