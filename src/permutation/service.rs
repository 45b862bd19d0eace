//! Permutation service: moves a [`PermutationList`] along its enumeration.
//!
//! Sequences of length `1..=M` over `N` raw values are ordered first by
//! length, then lexicographically using the supply order of the raw values
//! as digit order. Position `0` is the empty sequence, positions
//! `1..=N + N² + … + N^M` address every non-empty sequence exactly once.
//!
//! ```text
//! raw values [a, b], max growth 3
//!
//!   1 a      3 aa     7 aaa
//!   2 b      4 ab     8 aab
//!            5 ba     …
//!            6 bb    14 bbb
//! ```

use super::error::PermutationError;
use super::list::PermutationList;

/// Stateless service operating on permutation lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermutationService;

impl PermutationService {
    pub fn new() -> Self {
        Self
    }

    /// Advance `list` by `delta` positions.
    ///
    /// A `delta` below 1 is a no-op. Moving past the last sequence that fits
    /// into the list's growth limit fails with
    /// [`PermutationError::MaxGrowthReached`] and leaves the list unchanged.
    pub fn permute_by<T: Clone>(
        &self,
        list: &mut PermutationList<T>,
        delta: i64,
    ) -> Result<(), PermutationError> {
        if delta < 1 {
            return Ok(());
        }

        let current = self.index_of(list)?;
        let next = current
            .checked_add(delta as u128)
            .ok_or(PermutationError::MaxGrowthReached)?;
        let indices = indices_at(list.raw_values().len(), list.max_growth(), next)?;
        list.set_indices(indices)
    }

    /// Position of the list's current sequence in the enumeration.
    pub fn index_of<T: Clone>(&self, list: &PermutationList<T>) -> Result<u128, PermutationError> {
        position_of(list.current_indices(), list.raw_values().len())
    }
}

/// Number of non-empty sequences of length at most `max_growth` over `base`
/// raw values, saturating at `u128::MAX`.
pub fn capacity(base: usize, max_growth: usize) -> u128 {
    let base = base as u128;
    let mut total: u128 = 0;
    let mut count: u128 = 1;
    for _ in 0..max_growth {
        count = count.saturating_mul(base);
        total = total.saturating_add(count);
    }
    total
}

/// Encode a digit sequence as its enumeration position.
pub fn position_of(indices: &[usize], base: usize) -> Result<u128, PermutationError> {
    if indices.is_empty() {
        return Ok(0);
    }

    let overflow = || PermutationError::MaxGrowthReached;
    let shorter = capacity(base, indices.len() - 1);
    let base = base as u128;

    let mut offset: u128 = 0;
    for &digit in indices {
        offset = offset
            .checked_mul(base)
            .and_then(|o| o.checked_add(digit as u128))
            .ok_or_else(overflow)?;
    }

    shorter
        .checked_add(offset)
        .and_then(|p| p.checked_add(1))
        .ok_or_else(overflow)
}

/// Decode an enumeration position into its digit sequence.
pub fn indices_at(
    base: usize,
    max_growth: usize,
    index: u128,
) -> Result<Vec<usize>, PermutationError> {
    if index == 0 {
        return Ok(Vec::new());
    }

    let mut remaining = index;
    let mut len = 1;
    let mut count = base as u128;
    while remaining > count {
        remaining -= count;
        len += 1;
        if len > max_growth {
            return Err(PermutationError::MaxGrowthReached);
        }
        count = count.saturating_mul(base as u128);
    }
    if len > max_growth {
        return Err(PermutationError::MaxGrowthReached);
    }

    let mut offset = remaining - 1;
    let mut digits = vec![0; len];
    for digit in digits.iter_mut().rev() {
        *digit = (offset % base as u128) as usize;
        offset /= base as u128;
    }
    Ok(digits)
}

impl<T: Clone> PermutationList<T> {
    /// Position of the current sequence; see [`PermutationService::index_of`].
    pub fn position(&self) -> Result<u128, PermutationError> {
        position_of(self.current_indices(), self.raw_values().len())
    }

    /// Number of non-empty sequences this list can enumerate.
    pub fn capacity(&self) -> u128 {
        capacity(self.raw_values().len(), self.max_growth())
    }
}
