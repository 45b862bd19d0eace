//! # Activation Engine
//!
//! Runtime core for networks of small, independently callable behaviour
//! nodes that are wired together at execution time instead of through a
//! static call graph.
//!
//! Signals arrive at a node out of order, in incomplete sets and over
//! unbounded time. The [`activator`] keeps a bounded, persisted inbox per
//! node and decides which queued signals combine into a valid call, using
//! the [`permutation`] engine to search combinations reproducibly. The
//! result is a merged signal handed to the [`dispatch`] layer.

pub mod activator;
pub mod config;
pub mod dispatch;
pub mod payload;
pub mod permutation;
pub mod random;
pub mod registry;
pub mod server;
pub mod storage;

pub use activator::{ActivationError, Activator};
pub use config::{CachePolicy, EngineConfig};
pub use dispatch::{Dispatch, Dispatcher};
pub use payload::{Context, Signal, TypeTag, Value};
pub use permutation::{PermutationList, PermutationService};
pub use registry::{SignatureProvider, Unit, UnitRegistry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
