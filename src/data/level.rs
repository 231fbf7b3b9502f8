//! Random level generation for new skip list nodes
//!
//! Level counts follow a geometric distribution: a node reaches level
//! `n + 1` with probability `SKIPLIST_P` given that it reached level `n`,
//! truncated at `SKIPLIST_MAXLEVEL`. The generator is an explicit,
//! seedable dependency of the list so tests can script exact heights.

use crate::rng::DeterministicRng;

pub const SKIPLIST_MAXLEVEL: usize = 32;
pub const SKIPLIST_P: f64 = 0.25; // Probability for level promotion

/// Source of node heights.
///
/// Implementations must return a value in `1..=SKIPLIST_MAXLEVEL`; the list
/// clamps anything outside that range.
pub trait LevelGenerator {
    fn random_level(&mut self) -> usize;
}

/// Geometric level generator backed by a ChaCha8 stream
#[derive(Clone, Debug)]
pub struct GeometricLevel {
    rng: DeterministicRng,
}

impl GeometricLevel {
    pub fn seeded(seed: u64) -> Self {
        GeometricLevel {
            rng: DeterministicRng::new(seed),
        }
    }

    pub fn from_entropy() -> Self {
        GeometricLevel {
            rng: DeterministicRng::from_entropy(),
        }
    }
}

impl Default for GeometricLevel {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl LevelGenerator for GeometricLevel {
    fn random_level(&mut self) -> usize {
        // 16-bit fixed point, same threshold as the classic zset generator
        let threshold = (SKIPLIST_P * 65535.0) as u64;
        let mut level = 1;
        while level < SKIPLIST_MAXLEVEL && (self.rng.next_u64() & 0xFFFF) < threshold {
            level += 1;
        }
        level
    }
}

/// Replays a fixed sequence of heights, cycling when exhausted.
///
/// Heights are clamped to `1..=SKIPLIST_MAXLEVEL`. An empty script always
/// yields 1.
#[derive(Clone, Debug, Default)]
pub struct FixedLevels {
    levels: Vec<usize>,
    pos: usize,
}

impl FixedLevels {
    pub fn new(levels: Vec<usize>) -> Self {
        FixedLevels { levels, pos: 0 }
    }
}

impl LevelGenerator for FixedLevels {
    fn random_level(&mut self) -> usize {
        if self.levels.is_empty() {
            return 1;
        }
        let level = self.levels[self.pos % self.levels.len()];
        self.pos += 1;
        level.clamp(1, SKIPLIST_MAXLEVEL)
    }
}

impl<G: LevelGenerator + ?Sized> LevelGenerator for Box<G> {
    fn random_level(&mut self) -> usize {
        (**self).random_level()
    }
}
