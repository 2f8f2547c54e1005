use std::collections::HashMap;

use crate::error::{Result, SchedulerError};
use crate::parser::LeagueInput;

use super::pinned::PinnedSchedule;
use super::requirements::PairRequirement;
use super::types::{DesiredMatchup, EntityId};

/// A league ready to be scheduled: names resolved to ids and every input
/// cross-checked. Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Problem {
    entities: Vec<String>,
    index: HashMap<String, EntityId>,
    requirement: PairRequirement,
    pinned: PinnedSchedule,
    desired: Vec<DesiredMatchup>,
    weeks: usize,
    spacing: usize,
}

impl Problem {
    /// Builds the problem, rejecting anything that references unknown
    /// entities or can never be satisfied by construction.
    pub fn new(input: &LeagueInput, weeks: usize, spacing: usize) -> Result<Self> {
        if weeks == 0 {
            return Err(invalid("a schedule needs at least one week".to_string()));
        }
        if input.entities.is_empty() {
            return Err(invalid("no entities to schedule".to_string()));
        }

        let mut index = HashMap::with_capacity(input.entities.len());
        for (id, name) in input.entities.iter().enumerate() {
            if index.insert(name.clone(), id).is_some() {
                return Err(invalid(format!("entity {name} is listed twice")));
            }
        }

        let mut problem = Problem {
            entities: input.entities.clone(),
            index,
            requirement: PairRequirement::zeroed(input.entities.len()),
            pinned: PinnedSchedule::new(),
            desired: Vec::with_capacity(input.desired.len()),
            weeks,
            spacing,
        };

        problem.load_requirements(input)?;
        problem.load_pinned(input)?;
        problem.load_desired(input)?;

        let free_weeks = weeks - problem.pinned.week_count();
        if free_weeks > 0 && problem.entities.len() % 2 == 1 {
            return Err(invalid(format!(
                "{} entities cannot all be paired in a free week",
                problem.entities.len()
            )));
        }
        problem.check_season_totals()?;
        problem.check_pinned_spacing()?;

        Ok(problem)
    }

    /// Every week pairs every entity once, so each entity's matchups must
    /// add up to the season length
    fn check_season_totals(&self) -> Result<()> {
        for (entity, name) in self.entities.iter().enumerate() {
            let total = self.requirement.total_for(entity);
            if total as usize != self.weeks {
                return Err(invalid(format!(
                    "{name} is required to play {total} matchups in a {} week season",
                    self.weeks
                )));
            }
        }
        Ok(())
    }

    fn check_pinned_spacing(&self) -> Result<()> {
        for (week, a, b) in self.pinned.iter() {
            let clash = self.spacing_window(week).find(|&other| {
                other != week
                    && self
                        .pinned
                        .matchups(other)
                        .iter()
                        .any(|&pair| pair == (a, b) || pair == (b, a))
            });
            if let Some(other) = clash {
                return Err(invalid(format!(
                    "{} vs. {} is pinned in weeks {} and {}, closer than {} weeks",
                    self.entities[a],
                    self.entities[b],
                    week.min(other),
                    week.max(other),
                    self.spacing
                )));
            }
        }
        Ok(())
    }

    fn load_requirements(&mut self, input: &LeagueInput) -> Result<()> {
        for (entity, opponents) in &input.requirements {
            let e = self.resolve(entity, "requirements")?;
            for (opponent, &count) in opponents {
                let o = self.resolve(opponent, "requirements")?;
                if e == o && count > 0 {
                    return Err(invalid(format!("{entity} cannot be required to play itself")));
                }
                self.requirement.set(e, o, count);
            }
        }

        for a in 0..self.entities.len() {
            for b in (a + 1)..self.entities.len() {
                let (ab, ba) = (self.requirement.get(a, b), self.requirement.get(b, a));
                if ab != ba {
                    return Err(invalid(format!(
                        "{} must play {} {ab} times but {} must play {} {ba} times",
                        self.entities[a], self.entities[b], self.entities[b], self.entities[a]
                    )));
                }
            }
        }
        Ok(())
    }

    fn load_pinned(&mut self, input: &LeagueInput) -> Result<()> {
        let n = self.entities.len();
        let mut consumed = PairRequirement::zeroed(n);

        for (&week, matchups) in &input.pinned {
            if week == 0 || week > self.weeks {
                return Err(invalid(format!(
                    "pinned week {week} is outside 1..={}",
                    self.weeks
                )));
            }

            let mut opponents: Vec<Option<EntityId>> = vec![None; n];
            for (entity, opponent) in matchups {
                let a = self.resolve(entity, "pinned matchups")?;
                let b = self.resolve(opponent, "pinned matchups")?;
                if a == b {
                    return Err(invalid(format!("{entity} is pinned against itself in week {week}")));
                }

                // Both directions of one matchup may be listed
                match (opponents[a], opponents[b]) {
                    (None, None) => {
                        opponents[a] = Some(b);
                        opponents[b] = Some(a);
                        self.pinned.pin(week, a, b);
                        let used = consumed.get(a, b) + 1;
                        consumed.set(a, b, used);
                        consumed.set(b, a, used);
                    }
                    (Some(x), Some(y)) if x == b && y == a => {}
                    _ => {
                        return Err(invalid(format!(
                            "conflicting pins for {entity} vs. {opponent} in week {week}"
                        )))
                    }
                }
            }

            if let Some(missing) = opponents.iter().position(Option::is_none) {
                return Err(invalid(format!(
                    "pinned week {week} leaves {} without an opponent",
                    self.entities[missing]
                )));
            }
        }

        for a in 0..n {
            for b in (a + 1)..n {
                if consumed.get(a, b) > self.requirement.get(a, b) {
                    return Err(invalid(format!(
                        "{} vs. {} is pinned {} times but required only {}",
                        self.entities[a],
                        self.entities[b],
                        consumed.get(a, b),
                        self.requirement.get(a, b)
                    )));
                }
            }
        }
        Ok(())
    }

    fn load_desired(&mut self, input: &LeagueInput) -> Result<()> {
        for entry in &input.desired {
            if entry.week == 0 || entry.week > self.weeks {
                return Err(invalid(format!(
                    "desired matchup {} vs. {} is in week {}, outside 1..={}",
                    entry.entity, entry.opponent, entry.week, self.weeks
                )));
            }
            self.desired.push(DesiredMatchup {
                week: entry.week,
                entity: self.resolve(&entry.entity, "desired matchups")?,
                opponent: self.resolve(&entry.opponent, "desired matchups")?,
            });
        }
        Ok(())
    }

    fn resolve(&self, name: &str, context: &str) -> Result<EntityId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| invalid(format!("unknown entity {name:?} in {context}")))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn entity_name(&self, id: EntityId) -> &str {
        &self.entities[id]
    }

    pub fn requirement(&self) -> &PairRequirement {
        &self.requirement
    }

    pub fn pinned(&self) -> &PinnedSchedule {
        &self.pinned
    }

    pub fn desired(&self) -> &[DesiredMatchup] {
        &self.desired
    }

    pub fn weeks(&self) -> usize {
        self.weeks
    }

    /// Minimum number of weeks between two meetings of the same pair
    pub fn spacing(&self) -> usize {
        self.spacing
    }

    /// Inclusive 1-based week window around `week` in which a pair may not repeat.
    ///
    /// Shared by the search and the validator so both agree on what "too close" means.
    pub fn spacing_window(&self, week: usize) -> std::ops::RangeInclusive<usize> {
        let start = week.saturating_sub(self.spacing).max(1);
        let end = (week + self.spacing).min(self.weeks);
        start..=end
    }
}

fn invalid(message: String) -> SchedulerError {
    SchedulerError::InvalidInput(message)
}
