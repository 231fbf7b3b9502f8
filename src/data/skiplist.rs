//! Skip List Implementation for Sorted Sets
//!
//! A probabilistic data structure providing O(log n) expected insert, delete,
//! rank lookup and range scans over `(score, member)` pairs. Entries are
//! ordered by score, then by member bytes.
//!
//! Nodes live in an arena (`Vec<Option<SkipListNode>>`) and link to each other
//! by slot index. Slot 0 is the header sentinel: it carries `SKIPLIST_MAXLEVEL`
//! level entries and never holds data. Each level entry stores a `span`, the
//! number of level-0 hops to its forward node (or to the end of the list when
//! there is no forward node), which is what makes rank queries logarithmic.

use super::level::{GeometricLevel, LevelGenerator, SKIPLIST_MAXLEVEL};
use super::member::Member;
use crate::error::SkipListError;
use std::cmp::Ordering;
use std::io;
use tracing::{debug, trace, warn};

/// Arena slot of the header sentinel
const HEADER: usize = 0;

/// Handle to a data node.
///
/// Handles are invalidated when their node is removed; a later insert may
/// reuse the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct SkipListLevel {
    forward: Option<usize>, // Index of next node at this level
    span: usize,            // Level-0 hops to forward (or to end of list)
}

/// A node in the skip list
#[derive(Clone, Debug)]
struct SkipListNode {
    score: f64,
    member: Member,
    /// Previous node at level 0, `None` for the first node
    backward: Option<usize>,
    /// One entry per level; fixed at creation
    levels: Vec<SkipListLevel>,
}

/// Skip list over `(score, member)` pairs
#[derive(Clone, Debug)]
pub struct SkipList<G = GeometricLevel> {
    /// All nodes stored in a Vec (index 0 is header)
    nodes: Vec<Option<SkipListNode>>,
    /// Free list for reusing slots
    free_slots: Vec<usize>,
    /// Index of tail node
    tail: Option<usize>,
    /// Current max level in use
    level: usize,
    /// Number of elements
    length: usize,
    level_gen: G,
    /// Run `check_invariants` after every mutation (debug builds only)
    verify: bool,
}

impl SkipList<GeometricLevel> {
    /// Empty list with an entropy-seeded level generator.
    pub fn new() -> Self {
        Self::with_generator(GeometricLevel::from_entropy())
    }

    /// Empty list whose node heights are reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_generator(GeometricLevel::seeded(seed))
    }

    /// Fallible variant of [`SkipList::new`].
    pub fn try_new() -> Result<Self, SkipListError> {
        Self::try_with_capacity(GeometricLevel::from_entropy(), 0)
    }
}

impl Default for SkipList<GeometricLevel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: LevelGenerator> SkipList<G> {
    pub fn with_generator(level_gen: G) -> Self {
        SkipList {
            nodes: vec![Some(Self::header_node())],
            free_slots: Vec::new(),
            tail: None,
            level: 1,
            length: 0,
            level_gen,
            verify: false,
        }
    }

    /// Create a list with room for `capacity` entries, reporting allocator
    /// refusal instead of aborting.
    pub fn try_with_capacity(level_gen: G, capacity: usize) -> Result<Self, SkipListError> {
        let requested = capacity.saturating_add(1);
        let mut nodes = Vec::new();
        nodes
            .try_reserve(requested)
            .map_err(|_| SkipListError::AllocationFailed { requested })?;

        let mut header_levels = Vec::new();
        header_levels
            .try_reserve_exact(SKIPLIST_MAXLEVEL)
            .map_err(|_| SkipListError::AllocationFailed {
                requested: SKIPLIST_MAXLEVEL,
            })?;
        header_levels.extend((0..SKIPLIST_MAXLEVEL).map(|_| SkipListLevel {
            forward: None,
            span: 0,
        }));
        nodes.push(Some(SkipListNode {
            score: 0.0,
            member: Member::from_vec(Vec::new()),
            backward: None,
            levels: header_levels,
        }));

        Ok(SkipList {
            nodes,
            free_slots: Vec::new(),
            tail: None,
            level: 1,
            length: 0,
            level_gen,
            verify: false,
        })
    }

    fn header_node() -> SkipListNode {
        SkipListNode {
            score: 0.0,
            member: Member::from_vec(Vec::new()),
            backward: None,
            levels: (0..SKIPLIST_MAXLEVEL)
                .map(|_| SkipListLevel {
                    forward: None,
                    span: 0,
                })
                .collect(),
        }
    }

    /// Enable or disable the full structural check after every mutation.
    /// Only has an effect in debug builds.
    pub fn set_verify_invariants(&mut self, verify: bool) {
        self.verify = verify;
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of levels currently in use (at least 1)
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    fn node(&self, idx: usize) -> &SkipListNode {
        self.nodes[idx]
            .as_ref()
            .expect("node must exist at valid index")
    }

    #[inline]
    fn node_mut(&mut self, idx: usize) -> &mut SkipListNode {
        self.nodes[idx]
            .as_mut()
            .expect("node must exist at valid index")
    }

    /// Compare (score, member) tuples
    #[inline]
    fn compare(score1: f64, member1: &[u8], score2: f64, member2: &[u8]) -> Ordering {
        score1
            .partial_cmp(&score2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| member1.cmp(member2))
    }

    #[inline]
    fn cmp_node(&self, idx: usize, score: f64, member: &[u8]) -> Ordering {
        let node = self.node(idx);
        Self::compare(node.score, node.member.as_bytes(), score, member)
    }

    /// Allocate a node slot with `level` empty level entries
    fn alloc_node(
        &mut self,
        score: f64,
        member: Member,
        level: usize,
    ) -> Result<usize, SkipListError> {
        let mut levels = Vec::new();
        levels
            .try_reserve_exact(level)
            .map_err(|_| SkipListError::AllocationFailed { requested: level })?;
        levels.extend((0..level).map(|_| SkipListLevel {
            forward: None,
            span: 0,
        }));
        let node = SkipListNode {
            score,
            member,
            backward: None,
            levels,
        };

        if let Some(idx) = self.free_slots.pop() {
            self.nodes[idx] = Some(node);
            return Ok(idx);
        }

        self.nodes
            .try_reserve(1)
            .map_err(|_| SkipListError::AllocationFailed { requested: 1 })?;
        // Keep room to recycle every slot so removal never allocates
        self.free_slots
            .try_reserve(self.nodes.len() + 1 - self.free_slots.len())
            .map_err(|_| SkipListError::AllocationFailed { requested: 1 })?;
        let idx = self.nodes.len();
        self.nodes.push(Some(node));
        Ok(idx)
    }

    /// Free a node slot, handing back the node so its member can be observed
    fn free_node(&mut self, idx: usize) -> SkipListNode {
        let node = self.nodes[idx]
            .take()
            .expect("node must exist at valid index");
        self.free_slots.push(idx);
        node
    }

    /// Insert `(score, member)`.
    ///
    /// The caller guarantees no entry with exactly this pair exists; use
    /// [`SkipList::try_insert`] when that is not known. Entries sharing a
    /// score are ordered by member bytes.
    pub fn insert(&mut self, score: f64, member: Member) -> Result<NodeId, SkipListError> {
        if score.is_nan() {
            warn!(member = %member, "rejecting NaN score");
            return Err(SkipListError::NanScore);
        }
        debug_assert!(
            !self.contains(score, member.as_bytes()),
            "Precondition violated: ({}, {:?}) already present",
            score,
            member
        );

        let mut update = [HEADER; SKIPLIST_MAXLEVEL];
        let mut rank = [0usize; SKIPLIST_MAXLEVEL];

        // Find position at each level, recording rank crossed to reach it
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(fwd) = self.node(x).levels[i].forward {
                if self.cmp_node(fwd, score, member.as_bytes()) != Ordering::Less {
                    break;
                }
                rank[i] += self.node(x).levels[i].span;
                x = fwd;
            }
            update[i] = x;
        }

        let level = self.level_gen.random_level().clamp(1, SKIPLIST_MAXLEVEL);
        // Allocate before touching any links so failure leaves the list intact
        let new_idx = self.alloc_node(score, member, level)?;

        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEADER;
                let length = self.length;
                self.node_mut(HEADER).levels[i].span = length;
            }
            debug!(from = self.level, to = level, "skiplist level grew");
            self.level = level;
        }

        for i in 0..level {
            let prev = &self.node(update[i]).levels[i];
            let (old_forward, old_span) = (prev.forward, prev.span);
            let crossed = rank[0] - rank[i];

            let new_level = &mut self.node_mut(new_idx).levels[i];
            new_level.forward = old_forward;
            new_level.span = old_span - crossed;

            let prev = &mut self.node_mut(update[i]).levels[i];
            prev.forward = Some(new_idx);
            prev.span = crossed + 1;
        }

        // The new node is one more hop under every taller predecessor
        for i in level..self.level {
            self.node_mut(update[i]).levels[i].span += 1;
        }

        let backward = if update[0] == HEADER {
            None
        } else {
            Some(update[0])
        };
        self.node_mut(new_idx).backward = backward;

        let next = self.node(new_idx).levels[0].forward;
        match next {
            Some(fwd) => self.node_mut(fwd).backward = Some(new_idx),
            None => self.tail = Some(new_idx),
        }

        self.length += 1;
        trace!(score, rank = rank[0] + 1, level, "inserted");
        self.verify_after_mutation();
        Ok(NodeId(new_idx))
    }

    /// Insert only if the exact `(score, member)` pair is absent.
    pub fn try_insert(&mut self, score: f64, member: Member) -> Result<NodeId, SkipListError> {
        if score.is_nan() {
            warn!(member = %member, "rejecting NaN score");
            return Err(SkipListError::NanScore);
        }
        if self.contains(score, member.as_bytes()) {
            warn!(score, member = %member, "rejecting duplicate entry");
            return Err(SkipListError::Duplicate { score });
        }
        self.insert(score, member)
    }

    /// Unlink a node given its index and the per-level predecessors
    fn unlink(&mut self, idx: usize, update: &[usize; SKIPLIST_MAXLEVEL]) {
        for i in 0..self.level {
            let is_direct = self.node(update[i]).levels[i].forward == Some(idx);
            if is_direct {
                let removed = &self.node(idx).levels[i];
                let (removed_span, removed_fwd) = (removed.span, removed.forward);
                let prev = &mut self.node_mut(update[i]).levels[i];
                // (span + removed_span) - 1 avoids underflow when span is 0
                prev.span = prev.span + removed_span - 1;
                prev.forward = removed_fwd;
            } else {
                self.node_mut(update[i]).levels[i].span -= 1;
            }
        }

        let backward = self.node(idx).backward;
        let next = self.node(idx).levels[0].forward;
        match next {
            Some(fwd) => self.node_mut(fwd).backward = backward,
            None => self.tail = backward,
        }

        let before = self.level;
        while self.level > 1 && self.node(HEADER).levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        if self.level != before {
            debug!(from = before, to = self.level, "skiplist level shrank");
        }

        self.length -= 1;
    }

    /// Descend with strict less-than, recording the predecessor at each level
    fn find_update(&self, score: f64, member: &[u8]) -> [usize; SKIPLIST_MAXLEVEL] {
        let mut update = [HEADER; SKIPLIST_MAXLEVEL];
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(fwd) = self.node(x).levels[i].forward {
                if self.cmp_node(fwd, score, member) != Ordering::Less {
                    break;
                }
                x = fwd;
            }
            update[i] = x;
        }
        update
    }

    /// Remove the entry matching `(score, member)` exactly.
    /// Returns false when no such entry exists.
    pub fn delete(&mut self, score: f64, member: &[u8]) -> bool {
        // NaN equals no stored score
        if score.is_nan() {
            return false;
        }
        let update = self.find_update(score, member);

        // Entries may share a score; only an exact pair match is removed
        let candidate = self.node(update[0]).levels[0].forward;
        match candidate {
            Some(idx) if self.cmp_node(idx, score, member) == Ordering::Equal => {
                self.unlink(idx, &update);
                let node = self.free_node(idx);
                trace!(score, member = %node.member, "deleted");
                self.verify_after_mutation();
                true
            }
            _ => false,
        }
    }

    /// Remove every entry with 1-based rank in `start..=end`, calling
    /// `on_removed` with each member (in ascending rank order) just before it
    /// is dropped. Returns the number of entries removed.
    ///
    /// A `start` of 0 is treated as 1. Reversed bounds remove nothing; callers
    /// normalize the order first.
    pub fn delete_by_rank<F>(&mut self, start: usize, end: usize, mut on_removed: F) -> usize
    where
        F: FnMut(&Member),
    {
        let start = start.max(1);
        if start > end || start > self.length {
            return 0;
        }

        let mut update = [HEADER; SKIPLIST_MAXLEVEL];
        let mut traversed = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(fwd) = self.node(x).levels[i].forward {
                let span = self.node(x).levels[i].span;
                if traversed + span >= start {
                    break;
                }
                traversed += span;
                x = fwd;
            }
            update[i] = x;
        }

        traversed += 1;
        let mut removed = 0;
        let mut current = self.node(x).levels[0].forward;
        while let Some(idx) = current {
            if traversed > end {
                break;
            }
            let next = self.node(idx).levels[0].forward;
            self.unlink(idx, &update);
            let node = self.free_node(idx);
            on_removed(&node.member);
            removed += 1;
            traversed += 1;
            current = next;
        }

        trace!(start, end, removed, "deleted by rank");
        self.verify_after_mutation();
        removed
    }

    /// 1-based rank of the exact `(score, member)` pair, `None` if absent.
    pub fn rank_of(&self, score: f64, member: &[u8]) -> Option<usize> {
        if score.is_nan() {
            return None;
        }
        let mut rank = 0;
        let mut x = HEADER;

        for i in (0..self.level).rev() {
            while let Some(fwd) = self.node(x).levels[i].forward {
                if self.cmp_node(fwd, score, member) == Ordering::Greater {
                    break;
                }
                rank += self.node(x).levels[i].span;
                x = fwd;
            }
            // x is the header until something has been crossed
            if x != HEADER && self.cmp_node(x, score, member) == Ordering::Equal {
                return Some(rank);
            }
        }

        None
    }

    pub fn contains(&self, score: f64, member: &[u8]) -> bool {
        self.rank_of(score, member).is_some()
    }

    /// Arena index of the node at 1-based `rank`
    fn index_by_rank(&self, rank: usize) -> Option<usize> {
        if rank == 0 || rank > self.length {
            return None;
        }

        let mut traversed = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(fwd) = self.node(x).levels[i].forward {
                let span = self.node(x).levels[i].span;
                if traversed + span > rank {
                    break;
                }
                traversed += span;
                x = fwd;
            }
            if traversed == rank {
                return Some(x);
            }
        }

        None
    }

    /// Node at 1-based `rank`; `None` for 0 or past the end.
    pub fn node_by_rank(&self, rank: usize) -> Option<NodeId> {
        self.index_by_rank(rank).map(NodeId)
    }

    /// `(score, member)` at 1-based `rank`
    pub fn entry_by_rank(&self, rank: usize) -> Option<(f64, &Member)> {
        self.index_by_rank(rank).map(|idx| {
            let node = self.node(idx);
            (node.score, &node.member)
        })
    }

    /// Resolve a handle. Returns `None` for removed nodes.
    pub fn get(&self, id: NodeId) -> Option<(f64, &Member)> {
        if id.0 == HEADER {
            return None;
        }
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|node| (node.score, &node.member))
    }

    pub fn score_of(&self, id: NodeId) -> Option<f64> {
        self.get(id).map(|(score, _)| score)
    }

    pub fn first(&self) -> Option<(f64, &Member)> {
        self.node(HEADER).levels[0]
            .forward
            .map(|idx| (self.node(idx).score, &self.node(idx).member))
    }

    pub fn last(&self) -> Option<(f64, &Member)> {
        self.tail
            .map(|idx| (self.node(idx).score, &self.node(idx).member))
    }

    /// Cheap check that some part of the list may overlap `[min, max]`.
    pub fn is_in_range(&self, min: f64, max: f64) -> bool {
        // Ranges that are always empty
        if min.is_nan() || max.is_nan() || min > max {
            return false;
        }
        match self.tail {
            Some(tail) if self.node(tail).score >= min => {}
            _ => return false,
        }
        match self.node(HEADER).levels[0].forward {
            Some(first) => self.node(first).score <= max,
            None => false,
        }
    }

    fn first_index_in_range(&self, min: f64, max: f64) -> Option<usize> {
        if !self.is_in_range(min, max) {
            return None;
        }

        let mut x = HEADER;
        for i in (0..self.level).rev() {
            // Go forward while *OUT* of range
            while let Some(fwd) = self.node(x).levels[i].forward {
                if self.node(fwd).score >= min {
                    break;
                }
                x = fwd;
            }
        }

        // The tail is >= min, so a successor exists; it may still lie past max
        let first = self.node(x).levels[0].forward?;
        (self.node(first).score <= max).then_some(first)
    }

    fn last_index_in_range(&self, min: f64, max: f64) -> Option<usize> {
        if !self.is_in_range(min, max) {
            return None;
        }

        let mut x = HEADER;
        for i in (0..self.level).rev() {
            // Go forward while *IN* range
            while let Some(fwd) = self.node(x).levels[i].forward {
                if self.node(fwd).score > max {
                    break;
                }
                x = fwd;
            }
        }

        // The head is <= max, so x moved off the header; it may still lie below min
        (x != HEADER && self.node(x).score >= min).then_some(x)
    }

    /// First node with `min <= score <= max`
    pub fn first_in_range(&self, min: f64, max: f64) -> Option<NodeId> {
        self.first_index_in_range(min, max).map(NodeId)
    }

    /// Last node with `min <= score <= max`
    pub fn last_in_range(&self, min: f64, max: f64) -> Option<NodeId> {
        self.last_index_in_range(min, max).map(NodeId)
    }

    /// Members at 1-based ranks from `r1` to `r2` inclusive.
    ///
    /// When `r1 > r2` the walk runs backward from `r1`, yielding descending
    /// ranks. Nothing is returned if `r1` itself is out of bounds; a far end
    /// past the list is truncated.
    pub fn rank_range(&self, r1: usize, r2: usize) -> Vec<&Member> {
        // Saturates for bounds like (0, usize::MAX); the walk stops at the list end
        let (reverse, range_len) = if r1 <= r2 {
            (false, (r2 - r1).saturating_add(1))
        } else {
            (true, (r1 - r2).saturating_add(1))
        };

        let mut result = Vec::with_capacity(range_len.min(self.length));
        let mut current = self.index_by_rank(r1);
        while let Some(idx) = current {
            if result.len() >= range_len {
                break;
            }
            let node = self.node(idx);
            result.push(&node.member);
            current = if reverse {
                node.backward
            } else {
                node.levels[0].forward
            };
        }
        result
    }

    /// Members with score between `s1` and `s2`, both ends inclusive.
    ///
    /// When `s1 > s2` the entries in `[s2, s1]` come back in descending
    /// order.
    pub fn score_range(&self, s1: f64, s2: f64) -> Vec<&Member> {
        let reverse = s1 > s2;
        let mut current = if reverse {
            self.last_index_in_range(s2, s1)
        } else {
            self.first_index_in_range(s1, s2)
        };

        let mut result = Vec::new();
        while let Some(idx) = current {
            let node = self.node(idx);
            if reverse {
                if node.score < s2 {
                    break;
                }
                current = node.backward;
            } else {
                if node.score > s2 {
                    break;
                }
                current = node.levels[0].forward;
            }
            result.push(&node.member);
        }
        result
    }

    /// Drop every entry, keeping the header and level generator.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        for level in self.node_mut(HEADER).levels.iter_mut() {
            level.forward = None;
            level.span = 0;
        }
        self.free_slots.clear();
        self.tail = None;
        self.level = 1;
        self.length = 0;
    }

    /// Iterate over all entries in ascending order
    pub fn iter(&self) -> SkipListIter<'_, G> {
        SkipListIter {
            skiplist: self,
            front: self.node(HEADER).levels[0].forward,
            back: self.tail,
            remaining: self.length,
        }
    }

    /// Diagnostic listing, one line per entry in rank order.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, (score, member)) in self.iter().enumerate() {
            writeln!(out, "node {}: score:{:.6}, member:{}", i + 1, score, member)?;
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn verify_after_mutation(&self) {
        if self.verify {
            if let Err(violation) = self.check_invariants() {
                panic!("Invariant violated: {}", violation);
            }
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn verify_after_mutation(&self) {}

    /// Walk the whole structure and verify every structural invariant:
    /// ordering and uniqueness at level 0, higher levels as ordered
    /// subsequences, span sums matching level-0 ranks, backward links, tail,
    /// length and level bounds.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.level < 1 || self.level > SKIPLIST_MAXLEVEL {
            return Err(format!("level {} out of bounds", self.level));
        }

        let header = self.node(HEADER);
        if header.levels.len() != SKIPLIST_MAXLEVEL {
            return Err(format!("header has {} levels", header.levels.len()));
        }
        for i in self.level..SKIPLIST_MAXLEVEL {
            if header.levels[i].forward.is_some() {
                return Err(format!(
                    "header level {} populated above level {}",
                    i, self.level
                ));
            }
        }
        if self.level > 1 && header.levels[self.level - 1].forward.is_none() {
            return Err(format!("top level {} is empty", self.level));
        }

        // Level 0: order, backward links, tail, length, and each node's rank
        let mut rank_of_slot = vec![0usize; self.nodes.len()];
        let mut prev: Option<usize> = None;
        let mut count = 0;
        let mut current = header.levels[0].forward;
        while let Some(idx) = current {
            let node = self
                .nodes
                .get(idx)
                .and_then(Option::as_ref)
                .ok_or_else(|| format!("level 0 links to freed slot {}", idx))?;
            count += 1;
            if count > self.length {
                return Err(format!("level 0 chain longer than length {}", self.length));
            }
            if node.levels.is_empty() || node.levels.len() > SKIPLIST_MAXLEVEL {
                return Err(format!("node at rank {} has {} levels", count, node.levels.len()));
            }
            if node.levels.len() > self.level {
                return Err(format!(
                    "node at rank {} is taller ({}) than list level {}",
                    count,
                    node.levels.len(),
                    self.level
                ));
            }
            if node.backward != prev {
                return Err(format!(
                    "node at rank {} has backward {:?}, expected {:?}",
                    count, node.backward, prev
                ));
            }
            if node.levels[0].span != 1 && node.levels[0].forward.is_some() {
                return Err(format!("level 0 span at rank {} is {}", count, node.levels[0].span));
            }
            if let Some(p) = prev {
                let before = self.node(p);
                let order = Self::compare(
                    before.score,
                    before.member.as_bytes(),
                    node.score,
                    node.member.as_bytes(),
                );
                if order != Ordering::Less {
                    return Err(format!(
                        "order violated between ranks {} and {}: ({}, {}) vs ({}, {})",
                        count - 1,
                        count,
                        before.score,
                        before.member,
                        node.score,
                        node.member
                    ));
                }
            }
            rank_of_slot[idx] = count;
            prev = Some(idx);
            current = node.levels[0].forward;
        }
        if count != self.length {
            return Err(format!("level 0 has {} nodes, length is {}", count, self.length));
        }
        if self.tail != prev {
            return Err(format!("tail is {:?}, last node is {:?}", self.tail, prev));
        }

        // Upper levels: subsequence of level 0 with exact span bookkeeping
        for i in 0..self.level {
            let mut x = HEADER;
            let mut rank = 0;
            loop {
                let lvl = &self.node(x).levels[i];
                rank += lvl.span;
                match lvl.forward {
                    Some(fwd) => {
                        let expected = rank_of_slot.get(fwd).copied().unwrap_or(0);
                        if expected == 0 {
                            return Err(format!("level {} links to node missing from level 0", i));
                        }
                        if expected != rank {
                            return Err(format!(
                                "level {} span sum reaches rank {}, node is at rank {}",
                                i, rank, expected
                            ));
                        }
                        let height = self.node(fwd).levels.len();
                        if height <= i {
                            return Err(format!(
                                "level {} links to a node of height {}",
                                i, height
                            ));
                        }
                        x = fwd;
                    }
                    None => {
                        if rank != self.length {
                            return Err(format!(
                                "level {} spans total {}, length is {}",
                                i, rank, self.length
                            ));
                        }
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Double-ended iterator over `(score, member)` in rank order
pub struct SkipListIter<'a, G> {
    skiplist: &'a SkipList<G>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, G: LevelGenerator> Iterator for SkipListIter<'a, G> {
    type Item = (f64, &'a Member);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front?;
        let node = self.skiplist.node(idx);
        self.front = node.levels[0].forward;
        self.remaining -= 1;
        Some((node.score, &node.member))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, G: LevelGenerator> DoubleEndedIterator for SkipListIter<'a, G> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back?;
        let node = self.skiplist.node(idx);
        self.back = node.backward;
        self.remaining -= 1;
        Some((node.score, &node.member))
    }
}

impl<'a, G: LevelGenerator> ExactSizeIterator for SkipListIter<'a, G> {}
