//! Unit Registry: the catalogue of computation units and the behaviour
//! instances bound to them.
//!
//! The registry is constructed once at startup and shared by reference with
//! the activator (as a [`SignatureProvider`]) and the dispatcher. There is no
//! global instance.
//!
//! A topology file binds behaviour IDs to units:
//!
//! ```yaml
//! behaviours:
//!   - id: adder-1
//!     unit: sum
//!   - id: greeter
//!     unit: concat
//! ```

pub mod builtin;
pub mod error;
pub mod unit;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::payload::TypeTag;

pub use error::RegistryError;
pub use unit::{Handler, Unit};

/// Resolves the expected argument signature of a behaviour instance.
///
/// The leading context argument is excluded from the returned signature.
pub trait SignatureProvider: Send + Sync {
    fn signature(&self, behaviour_id: &str) -> Option<Vec<TypeTag>>;
}

/// One behaviour instance in a topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourBinding {
    pub id: String,
    pub unit: String,
}

/// Bindings of behaviour IDs to unit names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub behaviours: Vec<BehaviourBinding>,
}

impl Topology {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

/// Catalogue of units plus the behaviour instances bound to them.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    /// behaviour ID -> unit name
    behaviours: HashMap<String, String>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the demonstration units.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for unit in builtin::all() {
            registry.register(unit);
        }
        registry
    }

    /// Register a unit, replacing any unit with the same name.
    pub fn register(&mut self, unit: Unit) {
        self.units.insert(unit.name.clone(), unit);
    }

    /// Bind a behaviour instance to a registered unit.
    pub fn bind(&mut self, behaviour_id: &str, unit_name: &str) -> Result<(), RegistryError> {
        if !self.units.contains_key(unit_name) {
            return Err(RegistryError::UnknownUnit(unit_name.to_string()));
        }
        match self.behaviours.get(behaviour_id) {
            Some(existing) if existing != unit_name => Err(RegistryError::DuplicateBehaviour {
                behaviour_id: behaviour_id.to_string(),
                unit: existing.clone(),
            }),
            _ => {
                self.behaviours
                    .insert(behaviour_id.to_string(), unit_name.to_string());
                Ok(())
            }
        }
    }

    /// Bind every behaviour in `topology`; returns the number of bindings.
    pub fn apply_topology(&mut self, topology: &Topology) -> Result<usize, RegistryError> {
        for binding in &topology.behaviours {
            self.bind(&binding.id, &binding.unit)?;
        }
        log::info!("Applied topology with {} behaviours", topology.behaviours.len());
        Ok(topology.behaviours.len())
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    /// The unit a behaviour instance is bound to.
    pub fn unit_for(&self, behaviour_id: &str) -> Result<&Unit, RegistryError> {
        let name = self
            .behaviours
            .get(behaviour_id)
            .ok_or_else(|| RegistryError::UnknownBehaviour(behaviour_id.to_string()))?;
        self.units
            .get(name)
            .ok_or_else(|| RegistryError::UnknownUnit(name.clone()))
    }

    /// All bound behaviour IDs with their unit names, sorted by ID.
    pub fn behaviours(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<_> = self
            .behaviours
            .iter()
            .map(|(id, unit)| (id.as_str(), unit.as_str()))
            .collect();
        list.sort_unstable();
        list
    }
}

impl SignatureProvider for UnitRegistry {
    fn signature(&self, behaviour_id: &str) -> Option<Vec<TypeTag>> {
        self.unit_for(behaviour_id).ok().map(|u| u.signature.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_resolve_signature() {
        let mut registry = UnitRegistry::with_builtins();
        registry.bind("adder", "sum").unwrap();

        assert_eq!(
            registry.signature("adder"),
            Some(vec![TypeTag::Int, TypeTag::Int])
        );
        assert_eq!(registry.signature("nobody"), None);
        assert_eq!(registry.unit_for("adder").unwrap().name, "sum");
    }

    #[test]
    fn test_bind_unknown_unit() {
        let mut registry = UnitRegistry::new();
        assert_eq!(
            registry.bind("x", "sum"),
            Err(RegistryError::UnknownUnit("sum".into()))
        );
    }

    #[test]
    fn test_rebind_conflict() {
        let mut registry = UnitRegistry::with_builtins();
        registry.bind("x", "sum").unwrap();
        registry.bind("x", "sum").unwrap();
        assert!(matches!(
            registry.bind("x", "concat"),
            Err(RegistryError::DuplicateBehaviour { .. })
        ));
    }

    #[test]
    fn test_apply_topology() {
        let topology = Topology::from_yaml(
            "behaviours:\n  - id: b\n    unit: concat\n  - id: a\n    unit: sum\n",
        )
        .unwrap();

        let mut registry = UnitRegistry::with_builtins();
        assert_eq!(registry.apply_topology(&topology).unwrap(), 2);
        assert_eq!(registry.behaviours(), vec![("a", "sum"), ("b", "concat")]);
    }
}
