// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node constructors, for instantiating nodes by type name.
//!
//! The registry is an explicitly constructed value owned by the embedding
//! code and passed by reference wherever nodes are created generically
//! (deserialization, editor "create node of type X" operations). There is
//! no process-wide singleton.

use crate::node::{Node, NodeBehavior};
use indexmap::IndexMap;

/// A freshly constructed node: data half plus compute half, not yet owned
/// by any graph
pub struct NodeInstance {
    /// The node's identity and ports
    pub node: Node,
    /// The node's transfer function
    pub behavior: Box<dyn NodeBehavior>,
}

type Constructor = Box<dyn Fn() -> NodeInstance>;

/// Registry mapping a stable type name to a node constructor
#[derive(Default)]
pub struct NodeRegistry {
    constructors: IndexMap<String, Constructor>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }

    /// Register a constructor under `type_name`.
    ///
    /// Registering the same name twice is a logic error in the embedding
    /// code; there are no overwrite semantics.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        construct: impl Fn() -> NodeInstance + 'static,
    ) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            return Err(RegistryError::DuplicateType(type_name));
        }
        self.constructors.insert(type_name, Box::new(construct));
        Ok(())
    }

    /// Instantiate a node by type name; `None` if the name is unregistered
    pub fn instantiate(&self, type_name: &str) -> Option<NodeInstance> {
        self.constructors.get(type_name).map(|construct| construct())
    }

    /// Whether a type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// All registered type names, in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

/// Error when registering a node type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The type name is already registered
    #[error("Node type already registered: {0}")]
    DuplicateType(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{EvaluationError, Evaluator};
    use crate::node::NodeId;
    use crate::port::PortId;
    use crate::value::ValueType;

    struct Noop;

    impl NodeBehavior for Noop {
        fn evaluate(
            &mut self,
            _node: NodeId,
            _requested: PortId,
            _eval: &mut Evaluator<'_>,
        ) -> Result<(), EvaluationError> {
            Ok(())
        }
    }

    fn noop_instance() -> NodeInstance {
        NodeInstance {
            node: Node::new("noop", "Noop").with_output("Out", ValueType::Float),
            behavior: Box::new(Noop),
        }
    }

    #[test]
    fn test_register_and_instantiate() {
        let mut registry = NodeRegistry::new();
        registry.register("noop", noop_instance).unwrap();

        assert!(registry.contains("noop"));
        let inst = registry.instantiate("noop").unwrap();
        assert_eq!(inst.node.type_name, "noop");

        // Every instantiation gets a fresh identity.
        let again = registry.instantiate("noop").unwrap();
        assert_ne!(inst.node.id, again.node.id);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = NodeRegistry::new();
        registry.register("noop", noop_instance).unwrap();
        let err = registry.register("noop", noop_instance).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType(name) if name == "noop"));
    }

    #[test]
    fn test_unregistered_type_is_none() {
        let registry = NodeRegistry::new();
        assert!(registry.instantiate("missing").is_none());
        assert!(registry.is_empty());
    }
}
