//! Deterministic Simulation Testing for the skip list
//!
//! VOPR-style harness that drives a `SkipList` with a seeded stream of
//! inserts, deletes and rank-range deletes, mirrors every operation on a
//! `BTreeSet` reference model, and cross-checks structure and query results
//! after each step.
//!
//! ## Usage
//!
//! ```rust,ignore
//! for seed in 0..100 {
//!     let mut harness = SkipListDSTHarness::with_seed(seed);
//!     harness.run(500);
//!     assert!(harness.result().is_success(), "Seed {} failed", seed);
//! }
//! ```

use crate::data::{Member, SkipList, SkipListError};
use crate::rng::DeterministicRng;
use std::collections::BTreeSet;

/// Scores are `raw / SCORE_SCALE`, so the model can order by integer `raw`
const SCORE_SCALE: f64 = 4.0;

/// Configuration for skip list DST
#[derive(Debug, Clone)]
pub struct SkipListDSTConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of distinct members to draw from
    pub num_members: usize,
    /// Number of distinct raw scores to draw from (small = many ties)
    pub num_scores: u64,
    /// Probability of a delete by `(score, member)`
    pub delete_prob: f64,
    /// Probability of a delete by rank range
    pub delete_by_rank_prob: f64,
    /// Widest rank range removed at once
    pub max_rank_span: u64,
}

impl Default for SkipListDSTConfig {
    fn default() -> Self {
        SkipListDSTConfig {
            seed: 0,
            num_members: 100,
            num_scores: 400,
            delete_prob: 0.2,
            delete_by_rank_prob: 0.05,
            max_rank_span: 5,
        }
    }
}

impl SkipListDSTConfig {
    /// Standard configuration with given seed
    pub fn new(seed: u64) -> Self {
        SkipListDSTConfig {
            seed,
            ..Default::default()
        }
    }

    /// Few scores: most entries tie on score and order by member bytes
    pub fn score_ties(seed: u64) -> Self {
        SkipListDSTConfig {
            seed,
            num_members: 200,
            num_scores: 3,
            ..Default::default()
        }
    }

    /// Delete-heavy: the list repeatedly drains, shrinking its level
    pub fn churn(seed: u64) -> Self {
        SkipListDSTConfig {
            seed,
            num_members: 20,
            num_scores: 20,
            delete_prob: 0.35,
            delete_by_rank_prob: 0.15,
            max_rank_span: 10,
        }
    }

    /// Mostly inserts over a wide key space
    pub fn growth(seed: u64) -> Self {
        SkipListDSTConfig {
            seed,
            num_members: 5000,
            num_scores: 100_000,
            delete_prob: 0.05,
            delete_by_rank_prob: 0.01,
            max_rank_span: 3,
        }
    }
}

/// Operation type for logging
#[derive(Debug, Clone)]
pub enum SkipListOp {
    Insert { score: f64, member: String },
    Delete { score: f64, member: String },
    DeleteByRank { start: usize, end: usize },
}

/// Result of a skip list DST run
#[derive(Debug, Clone)]
pub struct SkipListDSTResult {
    /// Seed used
    pub seed: u64,
    /// Total operations executed
    pub total_operations: u64,
    /// Successful inserts
    pub inserts: u64,
    /// Inserts rejected as duplicates
    pub duplicates: u64,
    /// Deletes that found their entry
    pub deletes: u64,
    /// Deletes that found nothing
    pub missed_deletes: u64,
    /// Entries removed by rank range
    pub rank_removed: u64,
    /// Highest level reached
    pub max_level: usize,
    /// Invariant violations found (with operation context)
    pub invariant_violations: Vec<String>,
    /// Last operation before failure (if any)
    pub last_op: Option<SkipListOp>,
}

impl SkipListDSTResult {
    pub fn new(seed: u64) -> Self {
        SkipListDSTResult {
            seed,
            total_operations: 0,
            inserts: 0,
            duplicates: 0,
            deletes: 0,
            missed_deletes: 0,
            rank_removed: 0,
            max_level: 1,
            invariant_violations: Vec::new(),
            last_op: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.invariant_violations.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Seed {}: {} ops ({} inserts, {} dups, {} deletes, {} missed, {} by rank), max level {}, {} violations",
            self.seed,
            self.total_operations,
            self.inserts,
            self.duplicates,
            self.deletes,
            self.missed_deletes,
            self.rank_removed,
            self.max_level,
            self.invariant_violations.len()
        )
    }
}

/// DST harness for SkipList
pub struct SkipListDSTHarness {
    config: SkipListDSTConfig,
    rng: DeterministicRng,
    skiplist: SkipList,
    /// Reference model ordered by (raw score, member bytes)
    model: BTreeSet<(i64, Vec<u8>)>,
    result: SkipListDSTResult,
}

impl SkipListDSTHarness {
    pub fn new(config: SkipListDSTConfig) -> Self {
        let rng = DeterministicRng::new(config.seed);
        // Level stream decorrelated from the op stream
        let skiplist = SkipList::seeded(config.seed ^ 0x9E37_79B9_7F4A_7C15);
        SkipListDSTHarness {
            result: SkipListDSTResult::new(config.seed),
            config,
            rng,
            skiplist,
            model: BTreeSet::new(),
        }
    }

    /// Create with just a seed (uses default config)
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SkipListDSTConfig::new(seed))
    }

    fn random_member(&mut self) -> Vec<u8> {
        let idx = self.rng.gen_range(0, self.config.num_members as u64);
        // Variable-length members exercise the prefix-length tie-break
        format!("m{}", idx).into_bytes()
    }

    fn random_raw_score(&mut self) -> i64 {
        let span = self.config.num_scores.max(1);
        self.rng.gen_range(0, span) as i64 - (span / 2) as i64
    }

    fn score_of(raw: i64) -> f64 {
        raw as f64 / SCORE_SCALE
    }

    /// Run a single random operation
    fn run_single_op(&mut self) {
        let roll = self.rng.gen_range(0, 1000) as f64 / 1000.0;

        if roll < self.config.delete_by_rank_prob {
            self.op_delete_by_rank();
        } else if roll < self.config.delete_by_rank_prob + self.config.delete_prob {
            self.op_delete();
        } else {
            self.op_insert();
        }

        self.result.total_operations += 1;
        self.result.max_level = self.result.max_level.max(self.skiplist.level());

        if let Err(violation) = self.check_invariants() {
            self.result.invariant_violations.push(format!(
                "Op #{}: {:?} - {}",
                self.result.total_operations, self.result.last_op, violation
            ));
        }
    }

    fn op_insert(&mut self) {
        let raw = self.random_raw_score();
        let member = self.random_member();
        let score = Self::score_of(raw);
        self.result.last_op = Some(SkipListOp::Insert {
            score,
            member: String::from_utf8_lossy(&member).into_owned(),
        });

        let exists = self.model.contains(&(raw, member.clone()));
        match self.skiplist.try_insert(score, Member::from(member.clone())) {
            Ok(_) if !exists => {
                self.model.insert((raw, member));
                self.result.inserts += 1;
            }
            Err(SkipListError::Duplicate { .. }) if exists => {
                self.result.duplicates += 1;
            }
            other => {
                self.result.invariant_violations.push(format!(
                    "insert of existing={} returned {:?}",
                    exists, other
                ));
            }
        }
    }

    fn op_delete(&mut self) {
        // Half the time target a live entry so deletes actually land
        let (raw, member) = if !self.model.is_empty() && self.rng.gen_bool(0.5) {
            let nth = self.rng.gen_range(0, self.model.len() as u64) as usize;
            match self.model.iter().nth(nth) {
                Some(entry) => entry.clone(),
                None => return,
            }
        } else {
            (self.random_raw_score(), self.random_member())
        };
        let score = Self::score_of(raw);
        self.result.last_op = Some(SkipListOp::Delete {
            score,
            member: String::from_utf8_lossy(&member).into_owned(),
        });

        let expected = self.model.remove(&(raw, member.clone()));
        let deleted = self.skiplist.delete(score, &member);
        if deleted != expected {
            self.result.invariant_violations.push(format!(
                "delete returned {}, model expected {}",
                deleted, expected
            ));
        }
        if deleted {
            self.result.deletes += 1;
        } else {
            self.result.missed_deletes += 1;
        }
    }

    fn op_delete_by_rank(&mut self) {
        let len = self.skiplist.len() as u64;
        let start = self.rng.gen_range(1, len + 2) as usize;
        let end = start + self.rng.gen_range(0, self.config.max_rank_span) as usize;
        self.result.last_op = Some(SkipListOp::DeleteByRank { start, end });

        let expected: Vec<(i64, Vec<u8>)> = self
            .model
            .iter()
            .skip(start - 1)
            .take(end - start + 1)
            .cloned()
            .collect();

        let mut seen = Vec::new();
        let removed = self
            .skiplist
            .delete_by_rank(start, end, |member| seen.push(member.as_bytes().to_vec()));

        let expected_members: Vec<Vec<u8>> = expected.iter().map(|(_, m)| m.clone()).collect();
        if removed != expected.len() || seen != expected_members {
            self.result.invariant_violations.push(format!(
                "delete_by_rank({}, {}) removed {} {:?}, expected {:?}",
                start, end, removed, seen, expected_members
            ));
        }
        for entry in &expected {
            self.model.remove(entry);
        }
        self.result.rank_removed += removed as u64;
    }

    /// Check all invariants
    fn check_invariants(&mut self) -> Result<(), String> {
        self.skiplist.check_invariants()?;

        if self.skiplist.len() != self.model.len() {
            return Err(format!(
                "Length mismatch: skiplist={}, model={}",
                self.skiplist.len(),
                self.model.len()
            ));
        }

        for ((score, member), (raw, expected)) in self.skiplist.iter().zip(self.model.iter()) {
            if score != Self::score_of(*raw) || member.as_bytes() != expected.as_slice() {
                return Err(format!(
                    "Order mismatch: skiplist has ({}, {}), model has ({}, {})",
                    score,
                    member,
                    Self::score_of(*raw),
                    String::from_utf8_lossy(expected)
                ));
            }
        }

        if self.model.is_empty() {
            return Ok(());
        }

        // Rank round trip on a sampled rank
        let rank = self.rng.gen_range(1, self.model.len() as u64 + 1) as usize;
        let (score, member) = self
            .skiplist
            .entry_by_rank(rank)
            .ok_or_else(|| format!("entry_by_rank({}) returned None", rank))?;
        match self.skiplist.rank_of(score, member.as_bytes()) {
            Some(r) if r == rank => {}
            other => return Err(format!("rank_of(entry_by_rank({})) = {:?}", rank, other)),
        }

        // Score range against the model
        let a = self.random_raw_score();
        let b = self.random_raw_score();
        let (lo, hi) = (a.min(b), a.max(b));
        let mut expected: Vec<&[u8]> = self
            .model
            .iter()
            .filter(|(raw, _)| *raw >= lo && *raw <= hi)
            .map(|(_, m)| m.as_slice())
            .collect();
        let found: Vec<&[u8]> = self
            .skiplist
            .score_range(Self::score_of(a), Self::score_of(b))
            .into_iter()
            .map(|m| m.as_bytes())
            .collect();
        if a > b {
            expected.reverse();
        }
        if found != expected {
            return Err(format!(
                "score_range({}, {}) returned {} entries, expected {}",
                Self::score_of(a),
                Self::score_of(b),
                found.len(),
                expected.len()
            ));
        }

        // Rank range against the model, either direction
        let len = self.model.len() as u64;
        let r1 = self.rng.gen_range(1, len + 1) as usize;
        let r2 = self.rng.gen_range(1, len + 1) as usize;
        let (lo, hi) = (r1.min(r2), r1.max(r2));
        let mut expected: Vec<&[u8]> = self
            .model
            .iter()
            .skip(lo - 1)
            .take(hi - lo + 1)
            .map(|(_, m)| m.as_slice())
            .collect();
        if r1 > r2 {
            expected.reverse();
        }
        let found: Vec<&[u8]> = self
            .skiplist
            .rank_range(r1, r2)
            .into_iter()
            .map(|m| m.as_bytes())
            .collect();
        if found != expected {
            return Err(format!("rank_range({}, {}) mismatch", r1, r2));
        }

        Ok(())
    }

    /// Run specified number of operations
    pub fn run(&mut self, operations: usize) {
        for _ in 0..operations {
            self.run_single_op();

            // Stop early if we hit a violation
            if !self.result.invariant_violations.is_empty() {
                break;
            }
        }
    }

    /// Get the result
    pub fn result(&self) -> &SkipListDSTResult {
        &self.result
    }

    /// Get the skip list for inspection
    pub fn skiplist(&self) -> &SkipList {
        &self.skiplist
    }
}

/// Run a batch of DST tests with different seeds
pub fn run_skiplist_batch(
    start_seed: u64,
    num_seeds: usize,
    ops_per_seed: usize,
    config_fn: fn(u64) -> SkipListDSTConfig,
) -> Vec<SkipListDSTResult> {
    (0..num_seeds)
        .map(|i| {
            let seed = start_seed + i as u64;
            let mut harness = SkipListDSTHarness::new(config_fn(seed));
            harness.run(ops_per_seed);
            harness.result().clone()
        })
        .collect()
}

/// Summarize batch results
pub fn summarize_batch(results: &[SkipListDSTResult]) -> String {
    let total = results.len();
    let passed = results.iter().filter(|r| r.is_success()).count();
    let failed = total - passed;
    let total_ops: u64 = results.iter().map(|r| r.total_operations).sum();

    let mut summary = format!(
        "Skip List DST Summary\n\
         =====================\n\
         Seeds: {} total, {} passed, {} failed\n\
         Total operations: {}\n",
        total, passed, failed, total_ops
    );

    if failed > 0 {
        summary.push_str("\nFailed seeds:\n");
        for result in results.iter().filter(|r| !r.is_success()) {
            summary.push_str(&format!("  Seed {}: {}\n", result.seed, result.summary()));
            for violation in &result.invariant_violations {
                summary.push_str(&format!("    - {}\n", violation));
            }
        }
    }

    summary
}
