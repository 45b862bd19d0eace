//! Permutation engine errors.

use thiserror::Error;

/// Errors raised while building or advancing a permutation list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermutationError {
    /// The list cannot be built from the given raw values or growth limit.
    #[error("Invalid permutation config: {0}")]
    InvalidConfig(String),

    /// The requested position needs a sequence longer than the growth limit.
    #[error("Max growth reached")]
    MaxGrowthReached,

    /// A digit selector does not address any raw value.
    #[error("Index {index} out of range for {len} raw values")]
    IndexOutOfRange { index: usize, len: usize },
}
