// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazy pull evaluation with per-output caching.
//!
//! Evaluation is demand-driven: a pull on an output either hits its cache
//! or runs the owning node's behavior, which in turn pulls whatever inputs
//! it needs. Everything happens synchronously and recursively on the
//! calling thread; the only guard is a per-request set of currently
//! evaluating nodes that turns a dependency cycle into an error instead of
//! unbounded recursion.

use crate::context::EvalContext;
use crate::graph::{Graph, GraphError};
use crate::node::NodeId;
use crate::port::PortId;
use crate::value::{Value, ValueType};
use std::collections::HashSet;

impl Graph {
    /// Pull a value from an output under the given context.
    ///
    /// Returns the cached value when it was already computed under a
    /// context with the same key; otherwise runs the owning node's
    /// behavior, which must publish the output before returning.
    pub fn evaluate(
        &mut self,
        output: PortId,
        ctx: &EvalContext,
    ) -> Result<Value, EvaluationError> {
        let mut active = HashSet::new();
        self.evaluate_pull(output, ctx, &mut active)
    }

    fn evaluate_pull(
        &mut self,
        output: PortId,
        ctx: &EvalContext,
        active: &mut HashSet<NodeId>,
    ) -> Result<Value, EvaluationError> {
        let loc = self
            .location(output)
            .ok_or(GraphError::PortNotFound(output))?;
        if let Some(value) = self.output_port(output)?.cached(ctx.key()) {
            return Ok(value.clone());
        }

        let node_id = loc.node;
        if !active.insert(node_id) {
            return Err(EvaluationError::CycleDetected(node_id));
        }
        let Some(mut behavior) = self.take_behavior(node_id) else {
            active.remove(&node_id);
            return Err(GraphError::NodeNotFound(node_id).into());
        };

        let result = behavior.evaluate(
            node_id,
            output,
            &mut Evaluator {
                graph: self,
                ctx,
                active,
            },
        );
        self.put_behavior(node_id, behavior);
        active.remove(&node_id);
        result?;

        match self.output_port(output)?.cached(ctx.key()) {
            Some(value) => Ok(value.clone()),
            None => Err(EvaluationError::OutputNotProduced {
                node: node_id,
                port: output,
            }),
        }
    }
}

/// Handle a node behavior uses to read inputs and publish outputs during
/// one evaluation pass
pub struct Evaluator<'a> {
    graph: &'a mut Graph,
    ctx: &'a EvalContext,
    active: &'a mut HashSet<NodeId>,
}

impl Evaluator<'_> {
    /// The context of this evaluation pass
    pub fn context(&self) -> &EvalContext {
        self.ctx
    }

    /// Read an input of `node` by port name.
    ///
    /// Pulls through the wire when the input is connected, recursively
    /// evaluating upstream; otherwise returns the input's default value.
    pub fn input(&mut self, node: NodeId, name: &str) -> Result<Value, EvaluationError> {
        let (source, default) = {
            let node_ref = self.graph.node(node).ok_or(GraphError::NodeNotFound(node))?;
            let port = node_ref.input(name).ok_or_else(|| EvaluationError::UnknownPort {
                node,
                name: name.to_string(),
            })?;
            (port.source(), port.default_value().clone())
        };
        match source {
            Some(output) => self.graph.evaluate_pull(output, self.ctx, self.active),
            None => Ok(default),
        }
    }

    /// Publish a computed value on an output of `node`, by port name.
    ///
    /// The value is tagged with the context key, making the output's cache
    /// valid for the rest of this pass. Behaviors should publish every
    /// output they can cheaply compute, not just the requested one.
    pub fn set_output(
        &mut self,
        node: NodeId,
        name: &str,
        value: Value,
    ) -> Result<(), EvaluationError> {
        let node_ref = self
            .graph
            .node_mut(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let port = node_ref
            .output_by_name_mut(name)
            .ok_or_else(|| EvaluationError::UnknownPort {
                node,
                name: name.to_string(),
            })?;
        if port.value_type() != value.value_type() {
            return Err(EvaluationError::TypeMismatch {
                expected: port.value_type(),
                found: value.value_type(),
            });
        }
        port.store(self.ctx.key(), value);
        Ok(())
    }
}

/// Error during evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The pull chain re-entered a node that is already evaluating
    #[error("Dependency cycle detected at node {0:?}")]
    CycleDetected(NodeId),

    /// A behavior referred to a port name its node does not have
    #[error("Node {node:?} has no port named {name:?}")]
    UnknownPort {
        /// The node the lookup ran against
        node: NodeId,
        /// The port name that failed to resolve
        name: String,
    },

    /// A behavior published a value of the wrong type
    #[error("Type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The port's declared type
        expected: ValueType,
        /// The published value's type
        found: ValueType,
    },

    /// A behavior returned without publishing the requested output
    #[error("Node {node:?} did not produce requested output {port:?}")]
    OutputNotProduced {
        /// The node whose behavior ran
        node: NodeId,
        /// The output that stayed invalid
        port: PortId,
    },

    /// A port or node failed to resolve
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Behavior-specific failure
    #[error("{0}")]
    Custom(String),
}
