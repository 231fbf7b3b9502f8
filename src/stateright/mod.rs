//! Stateright Model Checking for the skip list
//!
//! Exhaustive state-space exploration complements the seeded simulation
//! tests in `dst`: where DST samples long random histories, the model
//! checker visits every bounded configuration of entries and node heights.
//!
//! ## Running Model Checks
//!
//! ```bash
//! # Bounded model (runs with the normal test suite)
//! cargo test stateright_skiplist -- --nocapture
//!
//! # Larger bounds
//! cargo test stateright_skiplist -- --ignored --nocapture
//! ```

pub mod skiplist;
