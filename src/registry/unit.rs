//! Behaviour units: named computations with a declared argument signature.

use std::fmt;
use std::sync::Arc;

use crate::payload::{signatures_match, TypeTag, Value};

use super::error::RegistryError;

/// Computation invoked with arguments already checked against the signature.
pub type Handler = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, RegistryError> + Send + Sync>;

/// A named, independently invocable computation unit.
///
/// `signature` lists the expected argument kinds in order. The execution
/// context is supplied separately and is not part of it.
#[derive(Clone)]
pub struct Unit {
    pub name: String,
    pub signature: Vec<TypeTag>,
    handler: Handler,
}

impl Unit {
    pub fn new<F>(name: impl Into<String>, signature: Vec<TypeTag>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, RegistryError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            handler: Arc::new(handler),
        }
    }

    /// Run the unit after checking `arguments` against its signature.
    pub fn invoke(&self, arguments: &[Value]) -> Result<Vec<Value>, RegistryError> {
        let actual: Vec<TypeTag> = arguments.iter().map(Value::type_tag).collect();
        if !signatures_match(&actual, &self.signature) {
            return Err(RegistryError::ArgumentMismatch {
                unit: self.name.clone(),
                expected: self.signature.clone(),
                actual,
            });
        }
        (self.handler)(arguments)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
