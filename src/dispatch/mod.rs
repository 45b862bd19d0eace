//! Dispatch layer: feeds arriving signals to the activator and runs the
//! destination unit once its inputs are complete.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::activator::{ActivationError, Activator};
use crate::payload::{Signal, Value};
use crate::registry::{RegistryError, UnitRegistry};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Outcome of handling one arriving signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dispatch {
    /// The destination ran on the merged signal.
    Executed { merged: Signal, outputs: Vec<Value> },
    /// The signal was queued; the destination still lacks inputs.
    Pending { behaviour_id: String, queued: usize },
}

pub struct Dispatcher {
    activator: Arc<Activator>,
    registry: Arc<UnitRegistry>,
}

impl Dispatcher {
    pub fn new(activator: Arc<Activator>, registry: Arc<UnitRegistry>) -> Self {
        Self {
            activator,
            registry,
        }
    }

    pub fn activator(&self) -> &Activator {
        &self.activator
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Route `signal` to its destination.
    pub fn handle(&self, signal: Signal) -> Result<Dispatch, DispatchError> {
        let destination = signal.destination.clone();

        match self.activator.activate(&destination, signal) {
            Ok(merged) => {
                let unit = self.registry.unit_for(&destination)?;
                let outputs = unit.invoke(&merged.arguments)?;
                log::debug!(
                    "Behaviour {} ({}) executed with sources {:?}",
                    destination,
                    unit.name,
                    merged.sources
                );
                Ok(Dispatch::Executed { merged, outputs })
            }
            Err(ActivationError::NetworkPayloadNotFound {
                behaviour_id,
                queued,
            }) => Ok(Dispatch::Pending {
                behaviour_id,
                queued,
            }),
            Err(e) => {
                if e.is_integrity() {
                    log::warn!("Rejected signal for behaviour {}: {}", destination, e);
                }
                Err(e.into())
            }
        }
    }
}
