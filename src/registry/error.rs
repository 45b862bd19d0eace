//! Unit registry errors.

use thiserror::Error;

use crate::payload::TypeTag;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No unit is registered under this name.
    #[error("Unit not found: {0}")]
    UnknownUnit(String),

    /// No behaviour instance is bound under this ID.
    #[error("Behaviour not found: {0}")]
    UnknownBehaviour(String),

    /// The behaviour ID is already bound to a different unit.
    #[error("Behaviour {behaviour_id} already bound to unit {unit}")]
    DuplicateBehaviour { behaviour_id: String, unit: String },

    /// Arguments do not satisfy the unit's signature.
    #[error("Unit {unit} expects {expected:?}, got {actual:?}")]
    ArgumentMismatch {
        unit: String,
        expected: Vec<TypeTag>,
        actual: Vec<TypeTag>,
    },

    /// The unit itself failed.
    #[error("Unit {unit} failed: {message}")]
    Execution { unit: String, message: String },
}
