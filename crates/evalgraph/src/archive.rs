// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary persistence for whole graphs.
//!
//! The archive stores each node as a `{id, type name, name}` header, the
//! id/direction/type/name (and input default) of every port, and an opaque
//! behavior state payload, followed by the flat list of wired pairs.
//! Output caches are never written; every cache starts invalid after a
//! load.
//!
//! Loading reconstructs nodes through a [`NodeRegistry`]: a freshly
//! constructed node gets fresh port ids, which are then overwritten with
//! the archived ids via a name-keyed remap, so wires resolve against the
//! new objects. A node whose type name is not registered is skipped with a
//! warning, along with every link touching it; the rest of the graph loads
//! normally.

use crate::graph::{Graph, GraphError, GraphId};
use crate::link::Link;
use crate::node::NodeId;
use crate::port::{PortDirection, PortId};
use crate::registry::NodeRegistry;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Archived form of one port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortArchive {
    /// The port's id at save time
    pub id: PortId,
    /// Which side of the node the port is on
    pub direction: PortDirection,
    /// The port's type tag
    pub value_type: ValueType,
    /// The port's name, the remap key on load
    pub name: String,
    /// The default value, for inputs
    pub default: Option<Value>,
}

/// Archived form of one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeArchive {
    /// The node's id at save time
    pub id: NodeId,
    /// Type name used to reconstruct the node through the registry
    pub type_name: String,
    /// Display name
    pub name: String,
    /// All ports, inputs then outputs
    pub ports: Vec<PortArchive>,
    /// Opaque behavior state payload
    pub state: Vec<u8>,
}

/// Archived form of a whole graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphArchive {
    /// The graph's id
    pub id: GraphId,
    /// Every node in the graph
    pub nodes: Vec<NodeArchive>,
    /// Every wired pair
    pub links: Vec<Link>,
}

/// Error while saving a graph
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The archive or a behavior state failed to encode
    #[error("Failed to encode graph archive: {0}")]
    Encode(#[from] bincode::Error),
}

/// Error while loading a graph
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The archive or a behavior state failed to decode
    #[error("Failed to decode graph archive: {0}")]
    Decode(#[from] bincode::Error),

    /// A resolvable archived link failed to wire
    #[error("Failed to restore link: {0}")]
    Wire(#[from] GraphError),
}

impl Graph {
    /// Serialize the graph to its binary archive form
    pub fn save(&self) -> Result<Vec<u8>, SaveError> {
        let mut nodes = Vec::with_capacity(self.node_count());
        for node in self.nodes() {
            let state = match self.behavior(node.id) {
                Some(behavior) => behavior.save_state()?,
                None => Vec::new(),
            };
            let mut ports = Vec::new();
            for port in node.inputs() {
                ports.push(PortArchive {
                    id: port.id,
                    direction: PortDirection::Input,
                    value_type: port.value_type(),
                    name: port.name.clone(),
                    default: Some(port.default_value().clone()),
                });
            }
            for port in node.outputs() {
                ports.push(PortArchive {
                    id: port.id,
                    direction: PortDirection::Output,
                    value_type: port.value_type(),
                    name: port.name.clone(),
                    default: None,
                });
            }
            nodes.push(NodeArchive {
                id: node.id,
                type_name: node.type_name.clone(),
                name: node.name.clone(),
                ports,
                state,
            });
        }
        let archive = GraphArchive {
            id: self.id,
            nodes,
            links: self.links().to_vec(),
        };
        Ok(bincode::serialize(&archive)?)
    }

    /// Reconstruct a graph from its binary archive form.
    ///
    /// `registry` supplies the node constructors; nodes of unregistered
    /// types are dropped (see module docs).
    pub fn load(bytes: &[u8], registry: &NodeRegistry) -> Result<Graph, LoadError> {
        let archive: GraphArchive = bincode::deserialize(bytes)?;
        let mut graph = Graph::new();
        graph.id = archive.id;

        for record in archive.nodes {
            let Some(mut instance) = registry.instantiate(&record.type_name) else {
                tracing::warn!(
                    type_name = %record.type_name,
                    name = %record.name,
                    "skipping node of unregistered type"
                );
                continue;
            };
            instance.node.id = record.id;
            instance.node.name = record.name;
            for port in record.ports {
                let remapped = match port.direction {
                    PortDirection::Input => {
                        match instance.node.input_by_name_mut(&port.name) {
                            Some(live) => {
                                live.id = port.id;
                                if let Some(default) = port.default {
                                    live.set_default(default);
                                }
                                true
                            }
                            None => false,
                        }
                    }
                    PortDirection::Output => instance
                        .node
                        .output_by_name_mut(&port.name)
                        .map(|live| live.id = port.id)
                        .is_some(),
                };
                if !remapped {
                    tracing::warn!(
                        type_name = %record.type_name,
                        port = %port.name,
                        "archived port has no match on the reconstructed node"
                    );
                }
            }
            instance.behavior.load_state(&record.state)?;
            graph.add_node(instance.node, instance.behavior);
        }

        for link in archive.links {
            if graph.location(link.input).is_none() || graph.location(link.output).is_none() {
                tracing::warn!(?link, "dropping link to a missing node or port");
                continue;
            }
            graph.connect(link.input, link.output)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvalContext;
    use crate::evaluation::{EvaluationError, Evaluator};
    use crate::node::{Node, NodeBehavior};
    use crate::nodes::{self, constants, math};
    use crate::value::Value;

    fn build_sample() -> (Graph, NodeId, NodeId) {
        let registry = nodes::standard_registry().unwrap();
        let mut graph = Graph::new();
        let c = graph.add_instance(constants::constant(Value::Float(7.0)));
        let add = graph.add_instance(registry.instantiate(math::ADD).unwrap());

        let c_out = graph.node(c).unwrap().output_id("Value").unwrap();
        let a = graph.node(add).unwrap().input_id("A").unwrap();
        let b = graph.node(add).unwrap().input_id("B").unwrap();
        graph.connect(a, c_out).unwrap();
        graph.set_input_default(b, Value::Float(2.0)).unwrap();
        (graph, c, add)
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let (graph, c, add) = build_sample();
        let bytes = graph.save().unwrap();

        let registry = nodes::standard_registry().unwrap();
        let loaded = Graph::load(&bytes, &registry).unwrap();

        assert_eq!(loaded.id, graph.id);
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.link_count(), 1);

        // Node and port ids are reattached to the reconstructed objects.
        let loaded_add = loaded.node(add).unwrap();
        assert_eq!(loaded_add.type_name, math::ADD);
        assert_eq!(
            loaded_add.input_id("A"),
            graph.node(add).unwrap().input_id("A")
        );
        let c_out = loaded.node(c).unwrap().output_id("Value").unwrap();
        assert_eq!(
            loaded.input_port(loaded_add.input_id("A").unwrap()).unwrap().source(),
            Some(c_out)
        );
    }

    #[test]
    fn test_round_trip_evaluates_identically() {
        let (mut graph, _, add) = build_sample();
        let sum = graph.node(add).unwrap().output_id("Sum").unwrap();
        let ctx = EvalContext::new(1);
        let before = graph.evaluate(sum, &ctx).unwrap();
        assert_eq!(before, Value::Float(9.0));

        let bytes = graph.save().unwrap();
        let registry = nodes::standard_registry().unwrap();
        let mut loaded = Graph::load(&bytes, &registry).unwrap();

        // Caches are never persisted.
        assert!(!loaded.output_port(sum).unwrap().is_cache_valid());
        assert_eq!(loaded.evaluate(sum, &ctx).unwrap(), before);
    }

    #[test]
    fn test_behavior_state_is_persisted() {
        let (graph, c, _) = build_sample();
        let bytes = graph.save().unwrap();
        let registry = nodes::standard_registry().unwrap();
        let mut loaded = Graph::load(&bytes, &registry).unwrap();

        // The registry constructs float constants at 0.0; the archived 7.0
        // must come back through the behavior state payload.
        let out = loaded.node(c).unwrap().output_id("Value").unwrap();
        assert_eq!(
            loaded.evaluate(out, &EvalContext::new(1)).unwrap(),
            Value::Float(7.0)
        );
    }

    struct Mystery;

    impl NodeBehavior for Mystery {
        fn evaluate(
            &mut self,
            node: NodeId,
            _requested: PortId,
            eval: &mut Evaluator<'_>,
        ) -> Result<(), EvaluationError> {
            eval.set_output(node, "Out", Value::Float(99.0))
        }
    }

    #[test]
    fn test_unregistered_type_degrades_gracefully() {
        let registry = nodes::standard_registry().unwrap();
        let mut graph = Graph::new();

        let mystery_node =
            Node::new("test.mystery", "Mystery").with_output("Out", ValueType::Float);
        let mystery_out = mystery_node.output_id("Out").unwrap();
        let mystery = graph.add_node(mystery_node, Box::new(Mystery));

        let add_a = graph.add_instance(registry.instantiate(math::ADD).unwrap());
        let add_b = graph.add_instance(registry.instantiate(math::ADD).unwrap());
        let a_in = graph.node(add_a).unwrap().input_id("A").unwrap();
        let b_in = graph.node(add_b).unwrap().input_id("A").unwrap();
        graph.connect(a_in, mystery_out).unwrap();
        graph.connect(b_in, mystery_out).unwrap();

        let bytes = graph.save().unwrap();
        // "test.mystery" is not in the standard registry.
        let mut loaded = Graph::load(&bytes, &registry).unwrap();

        assert!(loaded.node(mystery).is_none());
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.link_count(), 0);
        assert!(!loaded.input_port(a_in).unwrap().is_connected());
        assert!(!loaded.input_port(b_in).unwrap().is_connected());

        // Orphaned inputs fall back to their defaults.
        let sum = loaded.node(add_a).unwrap().output_id("Sum").unwrap();
        assert_eq!(
            loaded.evaluate(sum, &EvalContext::new(1)).unwrap(),
            Value::Float(0.0)
        );
    }
}
