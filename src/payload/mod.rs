//! Signals, argument values and the utilities that merge them.

pub mod merge;
pub mod signal;
pub mod value;

pub use merge::merge;
pub use signal::{Context, Signal};
pub use value::{signatures_match, TypeTag, Value};
