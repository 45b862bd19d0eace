//! Activation engine errors.

use thiserror::Error;

use crate::permutation::PermutationError;
use crate::random::RandomError;
use crate::storage::StorageError;

/// Errors returned by [`Activator::activate`](super::Activator::activate).
///
/// `NetworkPayloadNotFound` is expected during normal operation: the caller
/// waits for the next signal and tries again. `InvalidBehaviourId` and
/// `InvalidSources` point at a malformed upstream signal or corrupted state.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The destination or the signal's context cannot be resolved.
    #[error("Invalid behaviour ID: '{0}'")]
    InvalidBehaviourId(String),

    /// An inbox entry does not carry exactly one source.
    #[error("Invalid sources for behaviour {behaviour_id}: {sources:?}")]
    InvalidSources {
        behaviour_id: String,
        sources: Vec<String>,
    },

    /// No complete combination of queued signals exists yet. `queued` is
    /// the inbox length at the time of the decision.
    #[error("Network payload not found for behaviour {behaviour_id} ({queued} queued)")]
    NetworkPayloadNotFound { behaviour_id: String, queued: usize },

    /// The destination declares no arguments, so no signal can activate it.
    #[error("Behaviour {0} has an empty signature")]
    EmptySignature(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Random(#[from] RandomError),

    #[error(transparent)]
    Permutation(#[from] PermutationError),
}

impl ActivationError {
    /// Whether the caller should simply retry on the next arrival.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivationError::NetworkPayloadNotFound { .. })
    }

    /// Whether the error reports a contract violation by an upstream node.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            ActivationError::InvalidBehaviourId(_)
                | ActivationError::InvalidSources { .. }
                | ActivationError::EmptySignature(_)
        )
    }
}
