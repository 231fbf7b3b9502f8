//! Skip list errors - explicit results for conditions the list cannot absorb
//!
//! Lookups that miss are not errors: they return `None`, `0` or `false`.

/// Error returned by fallible skip list operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipListError {
    /// The allocator refused a reservation of `requested` elements/bytes.
    AllocationFailed { requested: usize },
    /// An entry with exactly this `(score, member)` pair already exists.
    Duplicate { score: f64 },
    /// NaN has no place in the score order.
    NanScore,
}

impl std::fmt::Display for SkipListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipListError::AllocationFailed { requested } => {
                write!(f, "allocation failed: could not reserve {} more", requested)
            }
            SkipListError::Duplicate { score } => {
                write!(f, "entry with score {} and identical member already exists", score)
            }
            SkipListError::NanScore => write!(f, "score is not a number"),
        }
    }
}

impl std::error::Error for SkipListError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SkipListError::AllocationFailed { requested: 8 }.to_string(),
            "allocation failed: could not reserve 8 more"
        );
        assert_eq!(
            SkipListError::Duplicate { score: 1.5 }.to_string(),
            "entry with score 1.5 and identical member already exists"
        );
        assert_eq!(SkipListError::NanScore.to_string(), "score is not a number");
    }
}
