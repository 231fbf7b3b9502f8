//! Skip list data structures
//!
//! - `Member`: immutable byte string with small-string optimization
//! - `LevelGenerator`: source of node heights (`GeometricLevel`, `FixedLevels`)
//! - `SkipList`: rank-indexable ordered `(score, member)` storage
//! - `SortedSet`: member-unique facade over `SkipList`

mod level;
mod member;
mod skiplist;
mod sorted_set;

pub use crate::error::SkipListError;
pub use level::{FixedLevels, GeometricLevel, LevelGenerator, SKIPLIST_MAXLEVEL, SKIPLIST_P};
pub use member::Member;
pub use skiplist::{NodeId, SkipList, SkipListIter};
pub use sorted_set::SortedSet;
