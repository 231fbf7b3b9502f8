//! Stateright Model for skip list structure
//!
//! A skip list's links and spans are fully determined by its sorted entries
//! and each node's height. The model state is exactly that pair; every
//! transition rebuilds a real `SkipList` with scripted heights, applies one
//! operation, and records any divergence from the expected entry set or any
//! broken structural invariant.
//!
//! Verified in every reachable state:
//! - structure_valid: ordering, subsequence levels, spans, backward links and
//!   tail all hold, and iteration order and ranks match the reference entries
//! - entries_bounded: the entry set and node heights stay within the config

use crate::data::{FixedLevels, Member, SkipList};
use stateright::{Model, Property};
use std::collections::BTreeMap;

/// Member table ordered by bytes, including a prefix pair ("a" < "ab")
pub const MEMBERS: [&str; 3] = ["a", "ab", "b"];

/// Model bounds
#[derive(Clone, Debug)]
pub struct SkipListModelConfig {
    pub num_scores: u8,
    pub max_height: u8,
    pub max_rank_span: usize,
}

impl Default for SkipListModelConfig {
    fn default() -> Self {
        SkipListModelConfig {
            num_scores: 2,
            max_height: 3,
            max_rank_span: 2,
        }
    }
}

/// Entries keyed by (score, member index), valued by node height
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SkipListState {
    pub entries: BTreeMap<(u8, u8), u8>,
    pub violation: Option<String>,
}

impl SkipListState {
    pub fn new() -> Self {
        SkipListState {
            entries: BTreeMap::new(),
            violation: None,
        }
    }
}

impl Default for SkipListState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SkipListAction {
    Insert { score: u8, member: u8, height: u8 },
    Delete { score: u8, member: u8 },
    DeleteByRank { start: usize, end: usize },
}

pub struct SkipListModel {
    pub config: SkipListModelConfig,
}

impl SkipListModel {
    pub fn new() -> Self {
        SkipListModel {
            config: SkipListModelConfig::default(),
        }
    }

    pub fn with_config(config: SkipListModelConfig) -> Self {
        SkipListModel { config }
    }

    /// Rebuild the concrete list; `extra` is the height of the next insert
    fn build(entries: &BTreeMap<(u8, u8), u8>, extra: Option<u8>) -> SkipList<FixedLevels> {
        let heights = entries
            .values()
            .chain(extra.iter())
            .map(|&h| h as usize)
            .collect();
        let mut list = SkipList::with_generator(FixedLevels::new(heights));
        for &(score, member) in entries.keys() {
            // Sorted order with scripted heights reproduces the exact layout
            let _ = list.insert(score as f64, Member::from(MEMBERS[member as usize]));
        }
        list
    }

    fn verify(list: &SkipList<FixedLevels>, entries: &BTreeMap<(u8, u8), u8>) -> Option<String> {
        if let Err(violation) = list.check_invariants() {
            return Some(violation);
        }
        if list.len() != entries.len() {
            return Some(format!("length {} vs model {}", list.len(), entries.len()));
        }
        for (rank, ((score, member), &(es, em))) in list.iter().zip(entries.keys()).enumerate() {
            if score != es as f64 || member.as_bytes() != MEMBERS[em as usize].as_bytes() {
                return Some(format!("rank {} holds ({}, {})", rank + 1, score, member));
            }
            if list.rank_of(score, member.as_bytes()) != Some(rank + 1) {
                return Some(format!("rank_of({}, {}) disagrees", score, member));
            }
        }
        None
    }
}

impl Default for SkipListModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for SkipListModel {
    type State = SkipListState;
    type Action = SkipListAction;

    fn init_states(&self) -> Vec<Self::State> {
        vec![SkipListState::new()]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        if state.violation.is_some() {
            return;
        }

        for score in 0..self.config.num_scores {
            for member in 0..MEMBERS.len() as u8 {
                if !state.entries.contains_key(&(score, member)) {
                    for height in 1..=self.config.max_height {
                        actions.push(SkipListAction::Insert { score, member, height });
                    }
                }
                // Deleting absent pairs is exercised too
                actions.push(SkipListAction::Delete { score, member });
            }
        }

        let len = state.entries.len();
        if len > 0 {
            for start in 1..=len + 1 {
                for width in 0..self.config.max_rank_span {
                    actions.push(SkipListAction::DeleteByRank {
                        start,
                        end: start + width,
                    });
                }
            }
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let mut next = state.clone();

        match action {
            SkipListAction::Insert { score, member, height } => {
                let mut list = Self::build(&state.entries, Some(height));
                let member_bytes = Member::from(MEMBERS[member as usize]);
                let inserted = list.try_insert(score as f64, member_bytes);
                next.entries.insert((score, member), height);
                next.violation = match inserted {
                    Ok(_) => Self::verify(&list, &next.entries),
                    Err(e) => Some(format!("insert failed: {}", e)),
                };
            }

            SkipListAction::Delete { score, member } => {
                let mut list = Self::build(&state.entries, None);
                let deleted = list.delete(score as f64, MEMBERS[member as usize].as_bytes());
                let expected = next.entries.remove(&(score, member)).is_some();
                next.violation = if deleted != expected {
                    Some(format!("delete returned {}, expected {}", deleted, expected))
                } else {
                    Self::verify(&list, &next.entries)
                };
            }

            SkipListAction::DeleteByRank { start, end } => {
                let mut list = Self::build(&state.entries, None);
                let doomed: Vec<(u8, u8)> = state
                    .entries
                    .keys()
                    .skip(start - 1)
                    .take(end + 1 - start)
                    .copied()
                    .collect();
                let mut seen = Vec::new();
                let removed = list.delete_by_rank(start, end, |m| seen.push(m.as_bytes().to_vec()));
                let expected: Vec<Vec<u8>> = doomed
                    .iter()
                    .map(|&(_, m)| MEMBERS[m as usize].as_bytes().to_vec())
                    .collect();
                for key in &doomed {
                    next.entries.remove(key);
                }
                next.violation = if removed != doomed.len() || seen != expected {
                    Some(format!("delete_by_rank({}, {}) removed {:?}", start, end, seen))
                } else {
                    Self::verify(&list, &next.entries)
                };
            }
        }

        Some(next)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("structure_valid", |_model: &SkipListModel, state: &SkipListState| {
                state.violation.is_none()
            }),
            Property::always("entries_bounded", |model: &SkipListModel, state: &SkipListState| {
                state.entries.len() <= model.config.num_scores as usize * MEMBERS.len()
                    && state
                        .entries
                        .values()
                        .all(|&h| h >= 1 && h <= model.config.max_height)
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateright::Checker;

    #[test]
    fn test_rebuild_matches_incremental_inserts() {
        let mut entries = BTreeMap::new();
        entries.insert((0, 1), 3);
        entries.insert((1, 0), 1);
        entries.insert((0, 0), 2);
        let list = SkipListModel::build(&entries, None);
        assert_eq!(list.level(), 3);
        assert!(SkipListModel::verify(&list, &entries).is_none());
    }

    #[test]
    fn test_single_transition() {
        let model = SkipListModel::new();
        let state = SkipListState::new();
        let next = model
            .next_state(&state, SkipListAction::Insert { score: 1, member: 2, height: 3 })
            .unwrap();
        assert!(next.violation.is_none());
        let next = model
            .next_state(&next, SkipListAction::DeleteByRank { start: 1, end: 1 })
            .unwrap();
        assert!(next.violation.is_none());
        assert!(next.entries.is_empty());
    }

    #[test]
    fn stateright_skiplist_model_check() {
        let model = SkipListModel::new();
        let checker = model.checker().spawn_bfs().join();

        println!("States explored: {}", checker.unique_state_count());

        checker.assert_properties();
    }

    #[test]
    #[ignore] // Run with: cargo test stateright_skiplist -- --ignored --nocapture
    fn stateright_skiplist_model_check_tall() {
        let model = SkipListModel::with_config(SkipListModelConfig {
            num_scores: 3,
            max_height: 4,
            max_rank_span: 3,
        });
        let checker = model.checker().spawn_bfs().join();

        println!("States explored: {}", checker.unique_state_count());

        checker.assert_properties();
    }
}
