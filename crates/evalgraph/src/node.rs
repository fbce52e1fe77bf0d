// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions: the computation units of the graph.
//!
//! A node is split into a data half ([`Node`]: identity plus owned ports)
//! and a compute half ([`NodeBehavior`]: the transfer function). The graph
//! stores both, keyed by [`NodeId`], which keeps the data half plainly
//! cloneable and lets behaviors stay trait objects.

use crate::archive::{LoadError, SaveError};
use crate::evaluation::{EvaluationError, Evaluator};
use crate::port::{InputPort, OutputPort, PortId};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node instance: identity and its owned input/output ports.
///
/// Ports are declared up front, at construction, and never transferred;
/// wiring between nodes goes through the owning graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Stable type name, the factory registration and serialization key
    pub type_name: String,
    /// Display name (can be customized)
    pub name: String,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
}

impl Node {
    /// Create a node with no ports yet
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            type_name: type_name.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declare an input port; the type tag is taken from the default value
    pub fn with_input(mut self, name: impl Into<String>, default: Value) -> Self {
        self.inputs.push(InputPort::new(name, default));
        self
    }

    /// Declare an output port of the given type
    pub fn with_output(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.outputs.push(OutputPort::new(name, value_type));
        self
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get an input port's ID by name
    pub fn input_id(&self, name: &str) -> Option<PortId> {
        self.input(name).map(|p| p.id)
    }

    /// Get an output port's ID by name
    pub fn output_id(&self, name: &str) -> Option<PortId> {
        self.output(name).map(|p| p.id)
    }

    /// All input ports
    pub fn inputs(&self) -> impl Iterator<Item = &InputPort> {
        self.inputs.iter()
    }

    /// All output ports
    pub fn outputs(&self) -> impl Iterator<Item = &OutputPort> {
        self.outputs.iter()
    }

    pub(crate) fn input_by_id(&self, id: PortId) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub(crate) fn input_by_id_mut(&mut self, id: PortId) -> Option<&mut InputPort> {
        self.inputs.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn output_by_id(&self, id: PortId) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.id == id)
    }

    pub(crate) fn output_by_id_mut(&mut self, id: PortId) -> Option<&mut OutputPort> {
        self.outputs.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn input_by_name_mut(&mut self, name: &str) -> Option<&mut InputPort> {
        self.inputs.iter_mut().find(|p| p.name == name)
    }

    pub(crate) fn output_by_name_mut(&mut self, name: &str) -> Option<&mut OutputPort> {
        self.outputs.iter_mut().find(|p| p.name == name)
    }
}

/// The transfer function of a node.
///
/// Behaviors pull whatever inputs they need through the [`Evaluator`] and
/// must publish the requested output (plus any sibling outputs they can
/// cheaply compute, to maximize cache reuse) via
/// [`Evaluator::set_output`] before returning.
pub trait NodeBehavior {
    /// Compute outputs for `node` under the evaluator's context.
    ///
    /// `requested` is the output port that triggered this call; the cache
    /// for it must be valid when this returns, or evaluation fails with
    /// [`EvaluationError::OutputNotProduced`].
    fn evaluate(
        &mut self,
        node: NodeId,
        requested: PortId,
        eval: &mut Evaluator<'_>,
    ) -> Result<(), EvaluationError>;

    /// Serialize behavior-specific state (literal parameters and the like).
    ///
    /// The default has no state and writes nothing.
    fn save_state(&self) -> Result<Vec<u8>, SaveError> {
        Ok(Vec::new())
    }

    /// Restore behavior-specific state written by [`Self::save_state`].
    fn load_state(&mut self, _bytes: &[u8]) -> Result<(), LoadError> {
        Ok(())
    }
}
