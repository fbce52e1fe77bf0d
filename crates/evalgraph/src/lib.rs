// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed dataflow graph with lazy, cached pull evaluation.
//!
//! This crate provides a single-threaded evaluation graph:
//! - Nodes declare typed input/output ports up front
//! - Wiring is validated (exact type match, single wire per input)
//! - Evaluation is demand-driven with per-output caches keyed by context
//! - Cache invalidation propagates as a wave through downstream nodes
//! - Whole graphs round-trip through a binary archive, reconstructing
//!   nodes by type name through a registry
//!
//! ## Architecture
//!
//! The [`Graph`] is the sole owner of its nodes and every port inside
//! them; ports refer to their counterparts by [`PortId`], never by
//! pointer. A node is split into a serializable data half ([`Node`]) and
//! a compute half ([`NodeBehavior`]) that pulls inputs and publishes
//! outputs through an [`Evaluator`] handle.

pub mod archive;
pub mod context;
pub mod evaluation;
pub mod graph;
pub mod link;
pub mod node;
pub mod nodes;
pub mod port;
pub mod registry;
pub mod value;

pub use archive::{GraphArchive, LoadError, NodeArchive, PortArchive, SaveError};
pub use context::{CacheKey, EvalContext};
pub use evaluation::{EvaluationError, Evaluator};
pub use graph::{Graph, GraphError, GraphId};
pub use link::Link;
pub use node::{Node, NodeBehavior, NodeId};
pub use port::{CachedValue, InputPort, OutputPort, PortDirection, PortId};
pub use registry::{NodeInstance, NodeRegistry, RegistryError};
pub use value::{Value, ValueType};
