//! Inbox helpers: bounded FIFO appends, integrity checks and pruning.

use crate::payload::Signal;

use super::error::ActivationError;

/// Append `signal`, evicting the oldest entries beyond `bound`.
///
/// Returns the evicted signals, oldest first.
pub fn push_bounded(inbox: &mut Vec<Signal>, signal: Signal, bound: usize) -> Vec<Signal> {
    inbox.push(signal);
    let excess = inbox.len().saturating_sub(bound);
    inbox.drain(..excess).collect()
}

/// Fail with `InvalidSources` on the first entry without exactly one source.
pub fn check_sources(behaviour_id: &str, inbox: &[Signal]) -> Result<(), ActivationError> {
    match inbox.iter().find(|s| s.single_source().is_none()) {
        Some(bad) => Err(ActivationError::InvalidSources {
            behaviour_id: behaviour_id.to_string(),
            sources: bad.sources.clone(),
        }),
        None => Ok(()),
    }
}

/// Remove the entries at `positions`, which must be distinct.
///
/// Positions past the end are ignored. Returns the removed signals in inbox
/// order.
pub fn remove_consumed(inbox: &mut Vec<Signal>, positions: &[usize]) -> Vec<Signal> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let len = inbox.len();
    let mut removed: Vec<Signal> = sorted
        .into_iter()
        .rev()
        .filter(|&pos| pos < len)
        .map(|pos| inbox.remove(pos))
        .collect();
    removed.reverse();
    removed
}
