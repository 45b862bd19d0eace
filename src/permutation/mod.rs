//! Permutation engine.
//!
//! Enumerates finite sequences drawn from a fixed pool of raw values,
//! addressed by a single integer position and capped in length. The
//! activator uses it to search input combinations reproducibly.

pub mod error;
pub mod list;
pub mod service;

pub use error::PermutationError;
pub use list::PermutationList;
pub use service::{capacity, indices_at, position_of, PermutationService};
