//! Sorted Set: member-unique view over the skip list
//!
//! The skip list itself trusts its caller not to insert an existing
//! `(score, member)` pair. `SortedSet` is that caller: it keeps a member→score
//! map beside the list so every insert is existence-checked, and re-adding a
//! member with a new score moves it instead of duplicating it.

use super::level::{GeometricLevel, LevelGenerator};
use super::member::Member;
use super::skiplist::SkipList;
use crate::error::SkipListError;
use ahash::AHashMap;
use std::collections::hash_map::Entry;

/// Sorted set using a hash map for O(1) score lookup and a skip list for
/// O(log n) ordered operations
#[derive(Clone, Debug)]
pub struct SortedSet<G = GeometricLevel> {
    members: AHashMap<Member, f64>,
    skiplist: SkipList<G>,
}

impl SortedSet<GeometricLevel> {
    pub fn new() -> Self {
        Self::with_skiplist(SkipList::new())
    }
}

impl Default for SortedSet<GeometricLevel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: LevelGenerator> SortedSet<G> {
    /// Wrap an empty skip list.
    pub fn with_skiplist(skiplist: SkipList<G>) -> Self {
        debug_assert!(skiplist.is_empty(), "Precondition violated: skiplist must start empty");
        SortedSet {
            members: AHashMap::new(),
            skiplist,
        }
    }

    #[cfg(debug_assertions)]
    fn verify_invariants(&self) {
        debug_assert_eq!(
            self.members.len(),
            self.skiplist.len(),
            "Invariant violated: members.len() ({}) != skiplist.len() ({})",
            self.members.len(),
            self.skiplist.len()
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn verify_invariants(&self) {}

    /// Add member with score. Returns true if new member, false if updated
    /// (or unchanged).
    pub fn add(&mut self, member: Member, score: f64) -> Result<bool, SkipListError> {
        if score.is_nan() {
            return Err(SkipListError::NanScore);
        }

        match self.members.entry(member) {
            Entry::Occupied(mut entry) => {
                let old_score = *entry.get();
                if old_score == score {
                    return Ok(false);
                }
                let removed = self.skiplist.delete(old_score, entry.key().as_bytes());
                debug_assert!(removed, "member in map but not in skiplist");
                if let Err(err) = self.skiplist.insert(score, entry.key().clone()) {
                    // Keep map and list consistent: the entry is gone from both
                    entry.remove();
                    return Err(err);
                }
                entry.insert(score);
                self.verify_invariants();
                Ok(false)
            }
            Entry::Vacant(entry) => {
                self.skiplist.insert(score, entry.key().clone())?;
                entry.insert(score);
                self.verify_invariants();
                Ok(true)
            }
        }
    }

    /// Remove member. Returns true if removed.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        let Some(score) = self.members.remove(member) else {
            return false;
        };
        let removed = self.skiplist.delete(score, member);
        debug_assert!(removed, "member in map but not in skiplist");
        self.verify_invariants();
        true
    }

    /// Get score of member. O(1)
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.members.get(member).copied()
    }

    /// 1-based rank of member. O(log n)
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.members.get(member)?;
        self.skiplist.rank_of(*score, member)
    }

    /// Members by 1-based rank, reversed when `r1 > r2`
    pub fn range_by_rank(&self, r1: usize, r2: usize) -> Vec<&Member> {
        self.skiplist.rank_range(r1, r2)
    }

    /// Members with score in `[s1, s2]`, descending when `s1 > s2`
    pub fn range_by_score(&self, s1: f64, s2: f64) -> Vec<&Member> {
        self.skiplist.score_range(s1, s2)
    }

    /// Remove members by 1-based rank range; bounds may be given in either
    /// order. Returns the removed members in ascending rank order.
    pub fn remove_range_by_rank(&mut self, r1: usize, r2: usize) -> Vec<Member> {
        let (start, end) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
        let members = &mut self.members;
        let mut removed = Vec::new();
        self.skiplist.delete_by_rank(start, end, |member| {
            if let Some((member, _)) = members.remove_entry(member.as_bytes()) {
                removed.push(member);
            }
        });
        self.verify_invariants();
        removed
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Underlying ordered storage
    pub fn skiplist(&self) -> &SkipList<G> {
        &self.skiplist
    }

    /// Check the map against the list and the list against itself.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.skiplist.check_invariants()?;
        if self.members.len() != self.skiplist.len() {
            return Err(format!(
                "members.len() ({}) != skiplist.len() ({})",
                self.members.len(),
                self.skiplist.len()
            ));
        }
        for (score, member) in self.skiplist.iter() {
            match self.members.get(member.as_bytes()) {
                Some(s) if *s == score => {}
                Some(s) => {
                    return Err(format!(
                        "score mismatch for '{}': skiplist={}, map={}",
                        member, score, s
                    ))
                }
                None => return Err(format!("member '{}' in skiplist but not in map", member)),
            }
        }
        Ok(())
    }
}
