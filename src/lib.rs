pub mod config;
pub mod data;
pub mod dst;
pub mod error;
#[cfg(feature = "lua")]
pub mod lua;
pub mod observability;
pub mod rng;

#[cfg(test)]
mod stateright;

pub use config::SkipListConfig;
pub use data::{Member, NodeId, SkipList, SortedSet};
pub use error::SkipListError;
