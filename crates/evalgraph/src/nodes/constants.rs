// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant source nodes, one per value type.
//!
//! A constant node has a single output named `"Value"` and a behavior whose
//! state is the constant itself, persisted through the behavior state hooks.

use crate::archive::{LoadError, SaveError};
use crate::evaluation::{EvaluationError, Evaluator};
use crate::node::{Node, NodeBehavior, NodeId};
use crate::port::PortId;
use crate::registry::{NodeInstance, NodeRegistry, RegistryError};
use crate::value::{Value, ValueType};

/// Type name of the boolean constant node
pub const BOOL: &str = "constant.bool";
/// Type name of the integer constant node
pub const INT: &str = "constant.int";
/// Type name of the float constant node
pub const FLOAT: &str = "constant.float";
/// Type name of the 2D vector constant node
pub const VECTOR2: &str = "constant.vector2";
/// Type name of the 3D vector constant node
pub const VECTOR3: &str = "constant.vector3";
/// Type name of the 4D vector constant node
pub const VECTOR4: &str = "constant.vector4";
/// Type name of the color constant node
pub const COLOR: &str = "constant.color";
/// Type name of the string constant node
pub const STRING: &str = "constant.string";

/// Behavior that publishes a stored constant
pub struct Constant {
    value: Value,
}

impl Constant {
    /// Create a constant behavior holding `value`
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The stored constant
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the stored constant.
    ///
    /// The owning node's output port keeps its declared type; publishing a
    /// value of a different type fails at evaluation time.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }
}

impl NodeBehavior for Constant {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        eval.set_output(node, "Value", self.value.clone())
    }

    fn save_state(&self) -> Result<Vec<u8>, SaveError> {
        Ok(bincode::serialize(&self.value)?)
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        self.value = bincode::deserialize(bytes)?;
        Ok(())
    }
}

fn type_name_for(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Bool => BOOL,
        ValueType::Int => INT,
        ValueType::Float => FLOAT,
        ValueType::Vector2 => VECTOR2,
        ValueType::Vector3 => VECTOR3,
        ValueType::Vector4 => VECTOR4,
        ValueType::Color => COLOR,
        ValueType::String => STRING,
    }
}

/// Build a constant node instance holding `value`.
///
/// The node's type name is chosen from the value's type, so instances built
/// here round-trip through a registry populated by [`register`].
pub fn constant(value: Value) -> NodeInstance {
    let value_type = value.value_type();
    let node =
        Node::new(type_name_for(value_type), "Constant").with_output("Value", value_type);
    NodeInstance {
        node,
        behavior: Box::new(Constant::new(value)),
    }
}

/// Register every constant node type
pub fn register(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    registry.register(BOOL, || constant(Value::Bool(false)))?;
    registry.register(INT, || constant(Value::Int(0)))?;
    registry.register(FLOAT, || constant(Value::Float(0.0)))?;
    registry.register(VECTOR2, || constant(Value::Vector2([0.0; 2])))?;
    registry.register(VECTOR3, || constant(Value::Vector3([0.0; 3])))?;
    registry.register(VECTOR4, || constant(Value::Vector4([0.0; 4])))?;
    registry.register(COLOR, || constant(Value::Color([0.0, 0.0, 0.0, 1.0])))?;
    registry.register(STRING, || constant(Value::String(String::new())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvalContext;
    use crate::graph::Graph;

    #[test]
    fn test_constant_publishes_its_value() {
        let mut graph = Graph::new();
        let instance = constant(Value::Float(7.5));
        let out = instance.node.output_id("Value").unwrap();
        graph.add_instance(instance);

        let value = graph.evaluate(out, &EvalContext::new(1)).unwrap();
        assert_eq!(value, Value::Float(7.5));
    }

    #[test]
    fn test_state_survives_save_and_load() {
        let saved = Constant::new(Value::Vector3([1.0, 2.0, 3.0]))
            .save_state()
            .unwrap();
        let mut restored = Constant::new(Value::Vector3([0.0; 3]));
        restored.load_state(&saved).unwrap();
        assert_eq!(restored.value(), &Value::Vector3([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_registry_builds_matching_type_names() {
        let mut registry = NodeRegistry::new();
        register(&mut registry).unwrap();
        let inst = registry.instantiate(FLOAT).unwrap();
        assert_eq!(inst.node.type_name, FLOAT);
        assert_eq!(
            inst.node.output("Value").unwrap().value_type(),
            ValueType::Float
        );
    }
}
