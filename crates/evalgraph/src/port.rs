// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions: the typed, named endpoints a node exposes.
//!
//! Ports never hold references to their counterparts. An input stores the
//! [`PortId`] of the output feeding it and an output stores the ids of the
//! inputs it feeds; the [`Graph`](crate::graph::Graph) owns all nodes and
//! resolves ids on demand, so there is no lifetime coupling between the two
//! ends of a wire.

use crate::context::CacheKey;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// A cached output value tagged with the context key it was computed under
#[derive(Debug, Clone)]
pub struct CachedValue {
    /// Key of the context the value was computed under
    pub key: CacheKey,
    /// The computed value
    pub value: Value,
}

/// An input port: carries a default value and at most one incoming wire
#[derive(Debug, Clone)]
pub struct InputPort {
    /// Unique port ID; reassigned on load to the archived id
    pub id: PortId,
    /// Port name, unique among the owning node's inputs (serialization key)
    pub name: String,
    value_type: ValueType,
    default: Value,
    source: Option<PortId>,
}

impl InputPort {
    /// Create an input port; the type tag is taken from the default value
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            value_type: default.value_type(),
            default,
            source: None,
        }
    }

    /// The port's type tag
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The value used when no output is connected
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The output currently feeding this input, if any
    pub fn source(&self) -> Option<PortId> {
        self.source
    }

    /// Whether an output is connected
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn set_default(&mut self, value: Value) {
        self.default = value;
    }

    pub(crate) fn attach(&mut self, output: PortId) {
        self.source = Some(output);
    }

    /// Clears the wire if it matches `output`; returns whether it did.
    pub(crate) fn detach(&mut self, output: PortId) -> bool {
        if self.source == Some(output) {
            self.source = None;
            true
        } else {
            false
        }
    }
}

/// An output port: carries a result cache and a fan-out list of target inputs
#[derive(Debug, Clone)]
pub struct OutputPort {
    /// Unique port ID; reassigned on load to the archived id
    pub id: PortId,
    /// Port name, unique among the owning node's outputs (serialization key)
    pub name: String,
    value_type: ValueType,
    cache: Option<CachedValue>,
    targets: Vec<PortId>,
}

impl OutputPort {
    /// Create an output port of the given type
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            value_type,
            cache: None,
            targets: Vec::new(),
        }
    }

    /// The port's type tag
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Inputs this output currently feeds
    pub fn targets(&self) -> &[PortId] {
        &self.targets
    }

    /// The cached value, if it was computed under a context with `key`
    pub fn cached(&self, key: CacheKey) -> Option<&Value> {
        match &self.cache {
            Some(entry) if entry.key == key => Some(&entry.value),
            _ => None,
        }
    }

    /// Whether the cache holds any value at all, regardless of key
    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_some()
    }

    /// Publish a freshly computed result tagged with `key`
    pub(crate) fn store(&mut self, key: CacheKey, value: Value) {
        self.cache = Some(CachedValue { key, value });
    }

    /// Reset the cache to invalid; returns whether it was valid before.
    pub(crate) fn clear_cache(&mut self) -> bool {
        self.cache.take().is_some()
    }

    pub(crate) fn add_target(&mut self, input: PortId) {
        self.targets.push(input);
    }

    /// Best-effort removal: a missing target is a no-op, not an error.
    pub(crate) fn remove_target(&mut self, input: PortId) {
        if let Some(pos) = self.targets.iter().position(|t| *t == input) {
            self.targets.swap_remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_from_default() {
        let port = InputPort::new("A", Value::Float(1.0));
        assert_eq!(port.value_type(), ValueType::Float);
        assert!(!port.is_connected());
    }

    #[test]
    fn test_input_detach_requires_match() {
        let mut port = InputPort::new("A", Value::Float(0.0));
        let fed_by = PortId::new();
        port.attach(fed_by);
        assert!(!port.detach(PortId::new()));
        assert!(port.is_connected());
        assert!(port.detach(fed_by));
        assert!(!port.is_connected());
    }

    #[test]
    fn test_output_cache_keyed() {
        let mut port = OutputPort::new("Out", ValueType::Float);
        assert!(port.cached(1).is_none());
        port.store(1, Value::Float(5.0));
        assert_eq!(port.cached(1), Some(&Value::Float(5.0)));
        assert!(port.cached(2).is_none());
        assert!(port.clear_cache());
        assert!(!port.clear_cache());
    }

    #[test]
    fn test_output_remove_target_is_lenient() {
        let mut port = OutputPort::new("Out", ValueType::Float);
        let a = PortId::new();
        port.add_target(a);
        // Removing something that was never added is a silent no-op.
        port.remove_target(PortId::new());
        assert_eq!(port.targets(), &[a]);
        port.remove_target(a);
        assert!(port.targets().is_empty());
    }
}
