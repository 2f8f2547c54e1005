use super::types::EntityId;

/// Required number of matchups for every ordered pair, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRequirement {
    size: usize,
    counts: Vec<u32>,
}

impl PairRequirement {
    /// No pair requires any matchup
    pub fn zeroed(size: usize) -> Self {
        Self {
            size,
            counts: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, entity: EntityId, opponent: EntityId) -> u32 {
        self.counts[index(self.size, entity, opponent)]
    }

    pub fn set(&mut self, entity: EntityId, opponent: EntityId, count: u32) {
        let i = index(self.size, entity, opponent);
        self.counts[i] = count;
    }

    /// Total matchups `entity` has to play over the season
    pub fn total_for(&self, entity: EntityId) -> u32 {
        (0..self.size).map(|o| self.get(entity, o)).sum()
    }
}

/// Remaining matchups per ordered pair while a search attempt is running.
///
/// A matchup always moves (a, b) and (b, a) together. The store is rebuilt
/// from the untouched `PairRequirement` at the start of every attempt.
#[derive(Debug, Clone)]
pub struct ConstraintStore {
    size: usize,
    remaining: Vec<i32>,
}

impl ConstraintStore {
    pub fn new(requirement: &PairRequirement) -> Self {
        let mut store = Self {
            size: requirement.size(),
            remaining: Vec::with_capacity(requirement.size() * requirement.size()),
        };
        store.reset(requirement);
        store
    }

    pub fn remaining(&self, entity: EntityId, opponent: EntityId) -> i32 {
        self.remaining[index(self.size, entity, opponent)]
    }

    pub fn decrement(&mut self, a: EntityId, b: EntityId) {
        self.remaining[index(self.size, a, b)] -= 1;
        self.remaining[index(self.size, b, a)] -= 1;
    }

    /// Inverse of `decrement`, used when a week is undone
    pub fn increment(&mut self, a: EntityId, b: EntityId) {
        self.remaining[index(self.size, a, b)] += 1;
        self.remaining[index(self.size, b, a)] += 1;
    }

    pub fn reset(&mut self, requirement: &PairRequirement) {
        assert_eq!(self.size, requirement.size(), "requirement size changed");
        self.remaining.clear();
        self.remaining
            .extend(requirement.counts.iter().map(|&c| c as i32));
    }

    /// True when every required matchup has been placed
    pub fn is_exhausted(&self) -> bool {
        self.remaining.iter().all(|&r| r == 0)
    }
}

fn index(size: usize, a: EntityId, b: EntityId) -> usize {
    assert!(a < size && b < size, "entity out of range: ({a}, {b}) with {size} entities");
    a * size + b
}
