// SPDX-License-Identifier: MIT OR Apache-2.0
//! Float math nodes.

use crate::evaluation::{EvaluationError, Evaluator};
use crate::node::{Node, NodeBehavior, NodeId};
use crate::port::PortId;
use crate::registry::{NodeInstance, NodeRegistry, RegistryError};
use crate::value::{Value, ValueType};

/// Type name of the add node
pub const ADD: &str = "math.add";
/// Type name of the multiply node
pub const MULTIPLY: &str = "math.multiply";
/// Type name of the negate node
pub const NEGATE: &str = "math.negate";
/// Type name of the lerp node
pub const LERP: &str = "math.lerp";
/// Type name of the sin/cos node
pub const SIN_COS: &str = "math.sin_cos";

fn float_input(eval: &mut Evaluator<'_>, node: NodeId, name: &str) -> Result<f32, EvaluationError> {
    let value = eval.input(node, name)?;
    value.as_float().ok_or(EvaluationError::TypeMismatch {
        expected: ValueType::Float,
        found: value.value_type(),
    })
}

struct Add;

impl NodeBehavior for Add {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        let a = float_input(eval, node, "A")?;
        let b = float_input(eval, node, "B")?;
        eval.set_output(node, "Sum", Value::Float(a + b))
    }
}

struct Multiply;

impl NodeBehavior for Multiply {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        let a = float_input(eval, node, "A")?;
        let b = float_input(eval, node, "B")?;
        eval.set_output(node, "Product", Value::Float(a * b))
    }
}

struct Negate;

impl NodeBehavior for Negate {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        let v = float_input(eval, node, "In")?;
        eval.set_output(node, "Out", Value::Float(-v))
    }
}

struct Lerp;

impl NodeBehavior for Lerp {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        let a = float_input(eval, node, "A")?;
        let b = float_input(eval, node, "B")?;
        let alpha = float_input(eval, node, "Alpha")?;
        eval.set_output(node, "Value", Value::Float(a + (b - a) * alpha))
    }
}

/// Computes sine and cosine together; requesting either output caches both.
struct SinCos;

impl NodeBehavior for SinCos {
    fn evaluate(
        &mut self,
        node: NodeId,
        _requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError> {
        let angle = float_input(eval, node, "Angle")?;
        eval.set_output(node, "Sin", Value::Float(angle.sin()))?;
        eval.set_output(node, "Cos", Value::Float(angle.cos()))
    }
}

/// Register every math node type
pub fn register(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    registry.register(ADD, || NodeInstance {
        node: Node::new(ADD, "Add")
            .with_input("A", Value::Float(0.0))
            .with_input("B", Value::Float(0.0))
            .with_output("Sum", ValueType::Float),
        behavior: Box::new(Add),
    })?;
    registry.register(MULTIPLY, || NodeInstance {
        node: Node::new(MULTIPLY, "Multiply")
            .with_input("A", Value::Float(1.0))
            .with_input("B", Value::Float(1.0))
            .with_output("Product", ValueType::Float),
        behavior: Box::new(Multiply),
    })?;
    registry.register(NEGATE, || NodeInstance {
        node: Node::new(NEGATE, "Negate")
            .with_input("In", Value::Float(0.0))
            .with_output("Out", ValueType::Float),
        behavior: Box::new(Negate),
    })?;
    registry.register(LERP, || NodeInstance {
        node: Node::new(LERP, "Lerp")
            .with_input("A", Value::Float(0.0))
            .with_input("B", Value::Float(1.0))
            .with_input("Alpha", Value::Float(0.0))
            .with_output("Value", ValueType::Float),
        behavior: Box::new(Lerp),
    })?;
    registry.register(SIN_COS, || NodeInstance {
        node: Node::new(SIN_COS, "Sin/Cos")
            .with_input("Angle", Value::Float(0.0))
            .with_output("Sin", ValueType::Float)
            .with_output("Cos", ValueType::Float),
        behavior: Box::new(SinCos),
    })?;
    Ok(())
}
