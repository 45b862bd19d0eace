//! Addressable enumeration state over a fixed pool of raw values.

use super::error::PermutationError;

/// A pool of raw values together with the cursor selecting one sequence.
///
/// `current_indices` holds one digit per position of the current sequence,
/// each addressing `raw_values`. The list never holds more than
/// `max_growth` digits.
#[derive(Debug, Clone)]
pub struct PermutationList<T> {
    raw_values: Vec<T>,
    current_indices: Vec<usize>,
    permuted_values: Vec<T>,
    max_growth: usize,
}

impl<T: Clone> PermutationList<T> {
    /// Create a list positioned on the empty sequence.
    ///
    /// Fails with [`PermutationError::InvalidConfig`] when fewer than two raw
    /// values are given or `max_growth` is zero.
    pub fn new(raw_values: Vec<T>, max_growth: usize) -> Result<Self, PermutationError> {
        if raw_values.len() < 2 {
            return Err(PermutationError::InvalidConfig(format!(
                "at least 2 raw values required, got {}",
                raw_values.len()
            )));
        }
        if max_growth < 1 {
            return Err(PermutationError::InvalidConfig(
                "max growth must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            raw_values,
            current_indices: Vec::new(),
            permuted_values: Vec::new(),
            max_growth,
        })
    }

    pub fn raw_values(&self) -> &[T] {
        &self.raw_values
    }

    pub fn current_indices(&self) -> &[usize] {
        &self.current_indices
    }

    /// The raw values selected by the current indices, in order.
    pub fn permuted_values(&self) -> &[T] {
        &self.permuted_values
    }

    pub fn max_growth(&self) -> usize {
        self.max_growth
    }

    /// Replace the cursor and recompute the permuted values.
    ///
    /// Rejects cursors longer than `max_growth` or addressing a value outside
    /// the pool; the list is left untouched in that case.
    pub fn set_indices(&mut self, indices: Vec<usize>) -> Result<(), PermutationError> {
        if indices.len() > self.max_growth {
            return Err(PermutationError::MaxGrowthReached);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= self.raw_values.len()) {
            return Err(PermutationError::IndexOutOfRange {
                index,
                len: self.raw_values.len(),
            });
        }

        self.permuted_values = indices
            .iter()
            .map(|&i| self.raw_values[i].clone())
            .collect();
        self.current_indices = indices;
        Ok(())
    }
}
