// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure: node ownership, wiring, and invalidation.

use crate::link::Link;
use crate::node::{Node, NodeBehavior, NodeId};
use crate::port::{InputPort, OutputPort, PortDirection, PortId};
use crate::registry::NodeInstance;
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a port lives: its owning node and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PortLocation {
    pub node: NodeId,
    pub direction: PortDirection,
}

/// A dataflow graph.
///
/// The graph is the sole owner of its nodes, their behaviors, and all the
/// port objects inside them. Wires are stored as port IDs on the endpoints
/// themselves, with a flat [`Link`] list alongside for enumeration and
/// serialization; the port index map resolves an ID to its owning node
/// without any cross-node pointers.
pub struct Graph {
    /// Unique graph ID
    pub id: GraphId,
    nodes: IndexMap<NodeId, Node>,
    behaviors: IndexMap<NodeId, Box<dyn NodeBehavior>>,
    links: Vec<Link>,
    ports: HashMap<PortId, PortLocation>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            id: GraphId::new(),
            nodes: IndexMap::new(),
            behaviors: IndexMap::new(),
            links: Vec::new(),
            ports: HashMap::new(),
        }
    }

    /// Add a node and its behavior to the graph; the graph takes ownership
    pub fn add_node(&mut self, node: Node, behavior: Box<dyn NodeBehavior>) -> NodeId {
        let id = node.id;
        for port in node.inputs() {
            self.ports.insert(
                port.id,
                PortLocation {
                    node: id,
                    direction: PortDirection::Input,
                },
            );
        }
        for port in node.outputs() {
            self.ports.insert(
                port.id,
                PortLocation {
                    node: id,
                    direction: PortDirection::Output,
                },
            );
        }
        self.nodes.insert(id, node);
        self.behaviors.insert(id, behavior);
        id
    }

    /// Add a freshly constructed [`NodeInstance`] (e.g. from a registry)
    pub fn add_instance(&mut self, instance: NodeInstance) -> NodeId {
        self.add_node(instance.node, instance.behavior)
    }

    /// Remove a node, first tearing down every wire touching it.
    ///
    /// After this returns, no remaining port in the graph refers to any
    /// port that belonged to the removed node.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.get(&node_id)?;

        let mut pairs: Vec<(PortId, PortId)> = Vec::new();
        for input in node.inputs() {
            if let Some(source) = input.source() {
                pairs.push((input.id, source));
            }
        }
        for output in node.outputs() {
            for target in output.targets() {
                pairs.push((*target, output.id));
            }
        }
        for (input, output) in pairs {
            let _ = self.disconnect(input, output);
        }

        let node = self.nodes.swap_remove(&node_id)?;
        self.behaviors.swap_remove(&node_id);
        for port in node.inputs() {
            self.ports.remove(&port.id);
        }
        for port in node.outputs() {
            self.ports.remove(&port.id);
        }
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get a node's behavior by ID
    pub fn behavior_mut(&mut self, node_id: NodeId) -> Option<&mut (dyn NodeBehavior + '_)> {
        self.behaviors.get_mut(&node_id).map(|b| &mut **b as &mut dyn NodeBehavior)
    }

    /// All nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The flat list of wired pairs
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of wired pairs
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Wire an output into an input.
    ///
    /// Both ports must exist, their type tags must match exactly, the input
    /// must be unconnected, and the two ends must belong to different
    /// nodes. The link list entry is recorded only after both endpoints are
    /// wired, so a failed connect leaves the graph untouched.
    pub fn connect(&mut self, input: PortId, output: PortId) -> Result<(), GraphError> {
        let in_loc = self.location(input).ok_or(GraphError::PortNotFound(input))?;
        let out_loc = self
            .location(output)
            .ok_or(GraphError::PortNotFound(output))?;
        if in_loc.node == out_loc.node {
            return Err(GraphError::SelfLoop);
        }

        let out_type = self.output_port(output)?.value_type();
        let in_port = self.input_port(input)?;
        if in_port.value_type() != out_type {
            return Err(GraphError::TypeMismatch {
                expected: in_port.value_type(),
                found: out_type,
            });
        }
        if in_port.is_connected() {
            return Err(GraphError::AlreadyConnected(input));
        }

        self.input_port_mut(input)?.attach(output);
        self.output_port_mut(output)?.add_target(input);
        self.links.push(Link::new(input, output));
        tracing::debug!(?input, ?output, "connected ports");

        // The input's node now sees a different upstream value.
        self.invalidate_node_outputs_inner(in_loc.node);
        Ok(())
    }

    /// Tear down the wire between an input and an output.
    ///
    /// Strict on the input side: the input must actually be fed by the
    /// given output. The output side removal is a best-effort no-op when
    /// absent.
    pub fn disconnect(&mut self, input: PortId, output: PortId) -> Result<(), GraphError> {
        let in_loc = self.location(input).ok_or(GraphError::PortNotFound(input))?;
        if !self.input_port_mut(input)?.detach(output) {
            return Err(GraphError::NotConnected { input, output });
        }
        self.output_port_mut(output)?.remove_target(input);
        if let Some(pos) = self
            .links
            .iter()
            .position(|l| l.input == input && l.output == output)
        {
            self.links.swap_remove(pos);
        }
        tracing::debug!(?input, ?output, "disconnected ports");

        // The input falls back to its default value.
        self.invalidate_node_outputs_inner(in_loc.node);
        Ok(())
    }

    /// Set an input's default value.
    ///
    /// When the input is unconnected the default is what evaluation reads,
    /// so the owning node's outputs are invalidated. A connected input
    /// keeps its wire; only the stored default changes.
    pub fn set_input_default(&mut self, input: PortId, value: Value) -> Result<(), GraphError> {
        let loc = self.location(input).ok_or(GraphError::PortNotFound(input))?;
        let port = self.input_port_mut(input)?;
        if port.value_type() != value.value_type() {
            return Err(GraphError::TypeMismatch {
                expected: port.value_type(),
                found: value.value_type(),
            });
        }
        port.set_default(value);
        if !port.is_connected() {
            self.invalidate_node_outputs_inner(loc.node);
        }
        Ok(())
    }

    /// Invalidate an output's cache and everything downstream of it.
    ///
    /// An already-invalid output stops the wave, which both bounds the work
    /// and terminates convergent (diamond-shaped) propagation.
    pub fn invalidate_output(&mut self, output: PortId) -> Result<(), GraphError> {
        self.output_port(output)?;
        self.invalidate_output_inner(output);
        Ok(())
    }

    /// Invalidate every output of a node and everything downstream
    pub fn invalidate_node_outputs(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        self.invalidate_node_outputs_inner(node_id);
        Ok(())
    }

    fn invalidate_output_inner(&mut self, output: PortId) {
        let targets = {
            let Ok(port) = self.output_port_mut(output) else {
                return;
            };
            if !port.clear_cache() {
                return;
            }
            port.targets().to_vec()
        };
        for target in targets {
            if let Some(loc) = self.location(target) {
                self.invalidate_node_outputs_inner(loc.node);
            }
        }
    }

    pub(crate) fn invalidate_node_outputs_inner(&mut self, node_id: NodeId) {
        let outputs: Vec<PortId> = match self.nodes.get(&node_id) {
            Some(node) => node.outputs().map(|p| p.id).collect(),
            None => return,
        };
        for output in outputs {
            self.invalidate_output_inner(output);
        }
    }

    pub(crate) fn location(&self, port: PortId) -> Option<PortLocation> {
        self.ports.get(&port).copied()
    }

    /// Resolve an input port by ID
    pub fn input_port(&self, port: PortId) -> Result<&InputPort, GraphError> {
        let loc = self.location(port).ok_or(GraphError::PortNotFound(port))?;
        if loc.direction != PortDirection::Input {
            return Err(GraphError::NotAnInput(port));
        }
        self.nodes
            .get(&loc.node)
            .and_then(|n| n.input_by_id(port))
            .ok_or(GraphError::PortNotFound(port))
    }

    /// Resolve an output port by ID
    pub fn output_port(&self, port: PortId) -> Result<&OutputPort, GraphError> {
        let loc = self.location(port).ok_or(GraphError::PortNotFound(port))?;
        if loc.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(port));
        }
        self.nodes
            .get(&loc.node)
            .and_then(|n| n.output_by_id(port))
            .ok_or(GraphError::PortNotFound(port))
    }

    pub(crate) fn input_port_mut(&mut self, port: PortId) -> Result<&mut InputPort, GraphError> {
        let loc = self.location(port).ok_or(GraphError::PortNotFound(port))?;
        if loc.direction != PortDirection::Input {
            return Err(GraphError::NotAnInput(port));
        }
        self.nodes
            .get_mut(&loc.node)
            .and_then(|n| n.input_by_id_mut(port))
            .ok_or(GraphError::PortNotFound(port))
    }

    pub(crate) fn output_port_mut(&mut self, port: PortId) -> Result<&mut OutputPort, GraphError> {
        let loc = self.location(port).ok_or(GraphError::PortNotFound(port))?;
        if loc.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(port));
        }
        self.nodes
            .get_mut(&loc.node)
            .and_then(|n| n.output_by_id_mut(port))
            .ok_or(GraphError::PortNotFound(port))
    }

    pub(crate) fn take_behavior(&mut self, node_id: NodeId) -> Option<Box<dyn NodeBehavior>> {
        self.behaviors.swap_remove(&node_id)
    }

    pub(crate) fn put_behavior(&mut self, node_id: NodeId, behavior: Box<dyn NodeBehavior>) {
        self.behaviors.insert(node_id, behavior);
    }

    pub(crate) fn behavior(&self, node_id: NodeId) -> Option<&dyn NodeBehavior> {
        self.behaviors.get(&node_id).map(|b| b.as_ref())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Error from a graph wiring or port mutation operation
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// The port is not an input
    #[error("Port is not an input: {0:?}")]
    NotAnInput(PortId),

    /// The port is not an output
    #[error("Port is not an output: {0:?}")]
    NotAnOutput(PortId),

    /// Endpoint type tags differ
    #[error("Incompatible port types: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Type of the receiving input
        expected: ValueType,
        /// Type of the offered value or output
        found: ValueType,
    },

    /// The input already has a wire
    #[error("Input already connected: {0:?}")]
    AlreadyConnected(PortId),

    /// The pair is not currently wired
    #[error("Input {input:?} is not connected to output {output:?}")]
    NotConnected {
        /// The input side of the pair
        input: PortId,
        /// The output side of the pair
        output: PortId,
    },

    /// Both ports belong to the same node
    #[error("Self-loop not allowed")]
    SelfLoop,
}
