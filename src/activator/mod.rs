//! Activation engine.
//!
//! Decides, for a behaviour node awaiting input, which of the signals it has
//! received so far combine into a valid call. Signals may arrive out of
//! order, in incomplete sets and over unbounded time, so each destination
//! keeps a bounded, persisted inbox plus a cache of the last source
//! combination that satisfied it.

pub mod error;
pub mod queue;
pub mod service;

#[cfg(test)]
mod tests;

pub use error::ActivationError;
pub use service::Activator;
