//! Network payloads exchanged between behaviour nodes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::{TypeTag, Value};

/// Tree/session context attached to every signal.
///
/// `behaviour_id` names the node instance the signal is addressed to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    pub behaviour_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behaviour_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Context {
    pub fn new(behaviour_id: impl Into<String>) -> Self {
        Self {
            behaviour_id: behaviour_id.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// One message forwarded from a source node to a destination node.
///
/// A signal fresh from its emitter has exactly one entry in `sources`.
/// Merged signals list one source per contributing signal, in match order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default = "new_signal_id")]
    pub id: String,
    pub sources: Vec<String>,
    pub destination: String,
    pub context: Context,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

fn new_signal_id() -> String {
    Uuid::new_v4().to_string()
}

impl Signal {
    /// Create a first-arrival signal with a single source.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        context: Context,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            id: new_signal_id(),
            sources: vec![source.into()],
            destination: destination.into(),
            context,
            arguments,
        }
    }

    /// Shorthand for a signal addressed to `destination` whose context
    /// carries the same behaviour ID.
    pub fn to(source: impl Into<String>, destination: &str, arguments: Vec<Value>) -> Self {
        Self::new(source, destination, Context::new(destination), arguments)
    }

    /// The lone source of an unmerged signal, or `None` when the signal
    /// carries zero or several sources.
    pub fn single_source(&self) -> Option<&str> {
        match self.sources.as_slice() {
            [source] => Some(source.as_str()),
            _ => None,
        }
    }

    /// Ordered type signature of the carried arguments.
    pub fn type_signature(&self) -> Vec<TypeTag> {
        self.arguments.iter().map(Value::type_tag).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source() {
        let mut signal = Signal::to("a", "d", vec![Value::Int(1)]);
        assert_eq!(signal.single_source(), Some("a"));

        signal.sources.push("b".into());
        assert_eq!(signal.single_source(), None);

        signal.sources.clear();
        assert_eq!(signal.single_source(), None);
    }

    #[test]
    fn test_type_signature() {
        let signal = Signal::to("a", "d", vec![Value::Int(1), Value::from("x")]);
        assert_eq!(signal.type_signature(), vec![TypeTag::Int, TypeTag::Str]);
    }

    #[test]
    fn test_deserialize_assigns_id() {
        let signal: Signal = serde_json::from_value(serde_json::json!({
            "sources": ["a"],
            "destination": "d",
            "context": {"behaviour_id": "d"},
            "arguments": [{"type": "bool", "value": true}]
        }))
        .unwrap();
        assert!(!signal.id.is_empty());
        assert_eq!(signal.arguments, vec![Value::Bool(true)]);
    }
}
