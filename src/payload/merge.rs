//! Combining matched signals into one dispatchable signal.

use crate::activator::error::ActivationError;

use super::signal::{Context, Signal};

/// Merge `parts` into a single signal addressed to `destination`.
///
/// Sources and arguments are concatenated in the order the parts are given.
/// Every part must be a first-arrival signal with exactly one source.
pub fn merge(
    destination: &str,
    context: &Context,
    parts: &[&Signal],
) -> Result<Signal, ActivationError> {
    let mut sources = Vec::with_capacity(parts.len());
    let mut arguments = Vec::new();

    for part in parts {
        let source = part
            .single_source()
            .ok_or_else(|| ActivationError::InvalidSources {
                behaviour_id: destination.to_string(),
                sources: part.sources.clone(),
            })?;
        sources.push(source.to_string());
        arguments.extend(part.arguments.iter().cloned());
    }

    let mut merged = Signal::new(String::new(), destination, context.clone(), arguments);
    merged.sources = sources;
    Ok(merged)
}
