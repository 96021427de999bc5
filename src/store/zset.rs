//! Keyed sorted sets ordered by `(score ascending, member lexicographic)`.
//!
//! Each set keeps a member-to-score map for O(1) lookups next to an ordered
//! set of `(score, member)` pairs for rank and range queries. The two are
//! updated together; a member appears in each exactly once.

use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;

use super::list::normalize_range;

#[derive(Debug, Default)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(OrderedFloat<f64>, String)>,
}

impl SortedSet {
    /// Inserts `member` with `score`, or updates the score of an existing
    /// member (which may change its rank). Returns `true` when the member is
    /// new.
    fn add(&mut self, member: &str, score: f64) -> bool {
        match self.scores.insert(member.to_string(), score) {
            Some(previous) => {
                self.ordered
                    .remove(&(OrderedFloat(previous), member.to_string()));
                self.ordered.insert((OrderedFloat(score), member.to_string()));
                false
            }
            None => {
                self.ordered.insert((OrderedFloat(score), member.to_string()));
                true
            }
        }
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(OrderedFloat(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    fn rank(&self, member: &str) -> Option<usize> {
        let score = *self.scores.get(member)?;
        self.ordered
            .iter()
            .position(|(s, m)| *s == OrderedFloat(score) && m == member)
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

#[derive(Debug, Default)]
pub struct SortedSetStore {
    entries: HashMap<String, SortedSet>,
}

impl SortedSetStore {
    /// Adds or updates one member; `true` means a fresh insert.
    pub fn add(&mut self, key: &str, score: f64, member: &str) -> bool {
        self.entries
            .entry(key.to_string())
            .or_default()
            .add(member, score)
    }

    /// Removes one member, deleting the set when it empties. Returns whether
    /// the member was present.
    pub fn remove(&mut self, key: &str, member: &str) -> bool {
        let Some(set) = self.entries.get_mut(key) else {
            return false;
        };
        let removed = set.remove(member);
        if set.len() == 0 {
            self.entries.remove(key);
        }
        removed
    }

    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.entries.get(key)?.scores.get(member).copied()
    }

    /// 0-based position of `member` in `(score, member)` order.
    pub fn rank(&self, key: &str, member: &str) -> Option<usize> {
        self.entries.get(key)?.rank(member)
    }

    pub fn card(&self, key: &str) -> usize {
        self.entries.get(key).map(SortedSet::len).unwrap_or(0)
    }

    /// Members between `start` and `stop` inclusive in rank order, with the
    /// same index normalization as list ranges.
    pub fn range(&self, key: &str, start: i64, stop: i64) -> Vec<String> {
        let Some(set) = self.entries.get(key) else {
            return Vec::new();
        };
        let Some((from, to)) = normalize_range(start, stop, set.len()) else {
            return Vec::new();
        };
        set.ordered
            .iter()
            .skip(from)
            .take(to - from + 1)
            .map(|(_, member)| member.clone())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}
