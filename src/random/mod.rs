//! Random-number collaborators.
//!
//! The activator picks uniformly among equally valid input combinations.
//! Production uses the thread-local generator; a seeded generator makes
//! runs reproducible.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Errors raised by random-number services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    /// Asked for a number in an empty range.
    #[error("Cannot pick from an empty range")]
    EmptyRange,

    /// The source of randomness could not produce a value.
    #[error("Random source unavailable: {0}")]
    Unavailable(String),
}

/// Source of uniformly distributed integers.
pub trait RandomService: Send + Sync {
    /// Return an integer in `[0, max)`.
    fn create_max(&self, max: usize) -> Result<usize, RandomError>;
}

/// Thread-local, OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomService for ThreadRandom {
    fn create_max(&self, max: usize) -> Result<usize, RandomError> {
        if max == 0 {
            return Err(RandomError::EmptyRange);
        }
        Ok(rand::thread_rng().gen_range(0..max))
    }
}

/// Deterministic generator seeded once at construction.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomService for SeededRandom {
    fn create_max(&self, max: usize) -> Result<usize, RandomError> {
        if max == 0 {
            return Err(RandomError::EmptyRange);
        }
        Ok(self.rng.lock().gen_range(0..max))
    }
}

/// Replays a scripted sequence of picks, each reduced modulo `max`.
///
/// Fails with [`RandomError::Unavailable`] once the script runs out.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    picks: Mutex<VecDeque<usize>>,
}

impl SequenceRandom {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
        }
    }
}

impl RandomService for SequenceRandom {
    fn create_max(&self, max: usize) -> Result<usize, RandomError> {
        if max == 0 {
            return Err(RandomError::EmptyRange);
        }
        self.picks
            .lock()
            .pop_front()
            .map(|pick| pick % max)
            .ok_or_else(|| RandomError::Unavailable("scripted picks exhausted".into()))
    }
}
