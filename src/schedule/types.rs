use serde::{Deserialize, Serialize};

/// Position of an entity in the input order
pub type EntityId = usize;

/// Opponents for every entity in a single week
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekAssignment {
    opponents: Vec<Option<EntityId>>, // entity -> opponent, None while unscheduled
}

impl WeekAssignment {
    /// A week where every entity is still unscheduled
    pub fn empty(entity_count: usize) -> Self {
        Self {
            opponents: vec![None; entity_count],
        }
    }

    pub fn opponent(&self, entity: EntityId) -> Option<EntityId> {
        self.opponents[entity]
    }

    pub fn is_scheduled(&self, entity: EntityId) -> bool {
        self.opponents[entity].is_some()
    }

    /// Writes `a` against `b` in both directions
    pub fn pair(&mut self, a: EntityId, b: EntityId) {
        self.opponents[a] = Some(b);
        self.opponents[b] = Some(a);
    }

    pub fn clear(&mut self) {
        self.opponents.iter_mut().for_each(|o| *o = None);
    }

    /// True once every entity has an opponent
    pub fn is_complete(&self) -> bool {
        self.opponents.iter().all(Option::is_some)
    }

    /// Each matchup once, lower id first
    pub fn matchups(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.opponents
            .iter()
            .enumerate()
            .filter_map(|(entity, opponent)| match opponent {
                Some(o) if entity < *o => Some((entity, *o)),
                _ => None,
            })
    }

    /// Every (entity, opponent) entry, including both directions of a matchup
    pub fn entries(&self) -> impl Iterator<Item = (EntityId, Option<EntityId>)> + '_ {
        self.opponents.iter().copied().enumerate()
    }

    /// Number of entities the week covers; only a hand-built week can differ
    /// from the league size
    pub(crate) fn len(&self) -> usize {
        self.opponents.len()
    }
}

/// A full season: one `WeekAssignment` per week, accessed with 1-based weeks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schedule {
    weeks: Vec<WeekAssignment>,
}

impl Schedule {
    /// All entities unscheduled in all weeks
    pub fn empty(weeks: usize, entity_count: usize) -> Self {
        Self {
            weeks: vec![WeekAssignment::empty(entity_count); weeks],
        }
    }

    pub fn from_weeks(weeks: Vec<WeekAssignment>) -> Self {
        Self { weeks }
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn week(&self, week: usize) -> &WeekAssignment {
        &self.weeks[week - 1]
    }

    pub fn week_mut(&mut self, week: usize) -> &mut WeekAssignment {
        &mut self.weeks[week - 1]
    }

    /// Whether `entity` plays `opponent` in `week`
    pub fn plays(&self, week: usize, entity: EntityId, opponent: EntityId) -> bool {
        self.week(week).opponent(entity) == Some(opponent)
    }

    /// Weeks paired with their 1-based number
    pub fn iter(&self) -> impl Iterator<Item = (usize, &WeekAssignment)> {
        self.weeks.iter().enumerate().map(|(i, w)| (i + 1, w))
    }
}

/// A matchup the league would like to see in a given week. Used for ranking only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredMatchup {
    pub week: usize,
    pub entity: EntityId,
    pub opponent: EntityId,
}

/// A validated schedule with its score against the desired matchups
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSchedule {
    pub schedule: Schedule,
    pub score: usize,
    pub matched: Vec<DesiredMatchup>,
}

/// A scored schedule after final ranking, with its short identifier
#[derive(Debug, Clone, Serialize)]
pub struct RankedSchedule {
    pub id: String,
    #[serde(flatten)]
    pub scored: ScoredSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_writes_both_directions() {
        let mut week = WeekAssignment::empty(4);
        week.pair(0, 2);

        assert_eq!(week.opponent(0), Some(2));
        assert_eq!(week.opponent(2), Some(0));
        assert!(!week.is_scheduled(1));
        assert!(!week.is_complete());

        week.pair(1, 3);
        assert!(week.is_complete());
        assert_eq!(week.matchups().collect::<Vec<_>>(), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn clear_unschedules_everyone() {
        let mut week = WeekAssignment::empty(2);
        week.pair(0, 1);
        week.clear();

        assert_eq!(week, WeekAssignment::empty(2));
    }

    #[test]
    fn schedule_weeks_are_one_based() {
        let mut schedule = Schedule::empty(3, 2);
        schedule.week_mut(3).pair(0, 1);

        assert!(schedule.plays(3, 0, 1));
        assert!(schedule.plays(3, 1, 0));
        assert!(!schedule.plays(1, 0, 1));
        assert_eq!(schedule.iter().map(|(w, _)| w).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
